//! USB CDC-ACM transport: one serial function, split into a receive half
//! that feeds the control task and a send half driven by the streamer.
use crate::prelude::*;
use eeg_bridge_bsp::usb::{UsbDriver, UsbDriverBuilder};
use eeg_bridge_core::Link;
use eeg_bridge_icd::{FrameChunker, FrameKind};
use embassy_usb::class::cdc_acm::{self, CdcAcmClass, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::{ConstStaticCell, StaticCell};

pub type CdcSender = cdc_acm::Sender<'static, UsbDriver>;
pub type CdcReceiver = cdc_acm::Receiver<'static, UsbDriver>;

// Statics
static CONFIG_DESCRIPTOR: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0; 256]);
static BOS_DESCRIPTOR: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0; 256]);
static MSOS_DESCRIPTOR: ConstStaticCell<[u8; 0]> = ConstStaticCell::new([]);
static CONTROL_BUF: ConstStaticCell<[u8; 64]> = ConstStaticCell::new([0; 64]);
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

// USB configuration
fn usb_config() -> Config<'static> {
    let mut config = Config::new(USB_VID, USB_PID);
    config.manufacturer = Some(MANUFACTURER);
    config.product = Some(USB_PRODUCT);
    config.serial_number = Some(USB_SERIAL);

    // Required for windows compatibility.
    // https://developer.nordicsemi.com/nRF_Connect_SDK/doc/1.9.1/kconfig/CONFIG_CDC_ACM_IAD.html#help
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;

    config
}

/// Builds the USB device with a single CDC-ACM function.
pub fn init_usb(
    usbd: UsbDriverBuilder,
) -> (UsbDevice<'static, UsbDriver>, CdcSender, CdcReceiver) {
    let mut builder = Builder::new(
        usbd.init(),
        usb_config(),
        CONFIG_DESCRIPTOR.take(),
        BOS_DESCRIPTOR.take(),
        MSOS_DESCRIPTOR.take(),
        CONTROL_BUF.take(),
    );
    let class =
        CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), USB_PACKET_SIZE);
    let (sender, receiver) = class.split();
    (builder.build(), sender, receiver)
}

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

/// Outbound half of the link, framing each message for the host.
pub struct UsbLink {
    sender: CdcSender,
    packet: [u8; USB_PACKET_SIZE as usize],
}

impl UsbLink {
    pub fn new(sender: CdcSender) -> Self {
        Self { sender, packet: [0; USB_PACKET_SIZE as usize] }
    }

    pub async fn wait_connection(&mut self) {
        self.sender.wait_connection().await;
    }

    async fn send_frame(
        &mut self,
        kind: FrameKind,
        payload: &[u8],
    ) -> Result<(), EndpointError> {
        let mut chunker = FrameChunker::new(kind, payload);
        while let Some(len) = chunker.next_packet(&mut self.packet) {
            self.sender.write_packet(&self.packet[..len]).await?;
        }
        Ok(())
    }
}

impl Link for UsbLink {
    type Error = EndpointError;

    async fn send_binary(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        self.send_frame(FrameKind::Binary, payload).await
    }

    async fn send_text(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        self.send_frame(FrameKind::Text, payload).await
    }
}

/// Turns received USB packets into control events. Each packet is one
/// message.
#[embassy_executor::task]
pub async fn rx_task(mut receiver: CdcReceiver, events: EventSender) {
    let mut buf = [0u8; USB_PACKET_SIZE as usize];
    loop {
        receiver.wait_connection().await;
        events.send(LinkEvent::Attached.into()).await;
        loop {
            match receiver.read_packet(&mut buf).await {
                Ok(len) => {
                    if let Some(inbound) = Inbound::classify(&buf[..len]) {
                        events.send(inbound.into()).await;
                    }
                }
                Err(EndpointError::BufferOverflow) => {
                    warn!("oversized USB packet dropped");
                }
                Err(EndpointError::Disabled) => break,
            }
        }
        events.send(LinkEvent::Detached.into()).await;
    }
}

/// Sends queued text replies first, then sample packets, for as long as a
/// client is attached.
#[embassy_executor::task]
pub async fn stream_task(mut link: UsbLink, streamer: &'static mut AppStreamer) {
    loop {
        link.wait_connection().await;
        debug!("USB link up");
        if let Err(e) = serve(&mut link, streamer).await {
            debug!("USB link down: {:?}", e);
        }
    }
}

async fn serve(
    link: &mut UsbLink,
    streamer: &mut AppStreamer,
) -> Result<(), EndpointError> {
    loop {
        CONTEXT.wait_for_client().await;
        while let Ok(reply) = REPLIES.try_receive() {
            link.send_text(&reply).await?;
        }
        match streamer.pump(link).await {
            Ok(_) => {}
            Err(EndpointError::BufferOverflow) => {
                warn!("sample packet rejected by the endpoint");
            }
            Err(e) => return Err(e),
        }
    }
}
