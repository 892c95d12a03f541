use crate::prelude::*;
use derive_more::From;

/// USB link state as seen by the receive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    Attached,
    Detached,
}

#[derive(Debug, From)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Link(LinkEvent),
    Inbound(Inbound),
}

/// Owns the controller and applies events one at a time.
#[embassy_executor::task]
pub async fn control_task(mut controller: AppController, receiver: EventReceiver) {
    if let Err(e) = controller.boot().await {
        error!("boot failed: {}", e.as_str());
    }

    loop {
        match receiver.receive().await {
            Event::Link(LinkEvent::Attached) => controller.on_connect(),
            Event::Link(LinkEvent::Detached) => {
                REPLIES.clear();
                if let Err(e) = controller.on_disconnect().await {
                    warn!("stop on detach failed: {}", e.as_str());
                }
            }
            Event::Inbound(Inbound::Control(Some(command))) => {
                if let Err(e) = controller.handle_control(command).await {
                    warn!("control {:?} rejected: {}", command, e.as_str());
                }
            }
            Event::Inbound(Inbound::Control(None)) => {
                debug!("unrecognized control byte ignored");
            }
            Event::Inbound(Inbound::Text(parsed)) => {
                let reply = match parsed {
                    Ok(command) => controller.handle_text(command).await,
                    Err(e) => {
                        debug!("bad text command: {:?}", e);
                        TextReply::Error
                    }
                };
                queue_reply(&reply);
            }
        }
    }
}

fn queue_reply(reply: &TextReply<'_>) {
    let encoded = match reply.encode() {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!("reply encoding failed: {:?}", e);
            return;
        }
    };
    if REPLIES.try_send(encoded).is_err() {
        warn!("reply queue full, dropping reply");
        return;
    }
    CONTEXT.wake_streamer();
}
