use actix::Addr;
use helpers::protocol::{FrameReader, FrameWriter};
use log::{info, warn};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::hub::{Inbound, Join, Leave};
use crate::Hub;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts participants on `listener` forever, serving each connection on
/// its own task. Accept errors are logged and skipped.
pub async fn run_hub(listener: TcpListener, hub: Addr<Hub>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("[HUB] connection from {}", peer);
                actix_rt::spawn(serve(stream, hub.clone()));
            }
            Err(e) => {
                warn!("[HUB] accept failed: {}", e);
                actix_rt::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

async fn serve(stream: TcpStream, hub: Addr<Hub>) {
    let (read_half, write_half) = stream.into_split();
    let (outbox, mut pending) = mpsc::unbounded_channel();

    let Ok(id) = hub.send(Join { outbox }).await else {
        return;
    };

    let mut writer = FrameWriter::new(write_half);
    actix_rt::spawn(async move {
        while let Some(frame) = pending.recv().await {
            if writer.send(&frame).await.is_err() {
                break;
            }
        }
    });

    let mut reader = FrameReader::new(read_half);
    loop {
        match reader.receive().await {
            Ok(Some(frame)) => hub.do_send(Inbound { from: id, frame }),
            Ok(None) => {
                info!("[HUB] {} disconnected", id);
                break;
            }
            Err(e) => {
                warn!("[HUB] dropping {}: {}", id, e);
                break;
            }
        }
    }
    hub.do_send(Leave { id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix::Actor;
    use helpers::participant_id::ParticipantId;
    use helpers::Frame;

    async fn next_leader(reader: &mut FrameReader<TcpStream>) -> Option<ParticipantId> {
        loop {
            match reader.receive().await.unwrap() {
                Some(Frame::LeadershipChanged { new_leader, .. }) => return new_leader,
                Some(_) => continue,
                None => panic!("hub hung up"),
            }
        }
    }

    #[actix_rt::test]
    async fn test_keeps_serving_after_a_participant_disconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        actix_rt::spawn(run_hub(listener, Hub::new().start()));

        let mut first = FrameReader::new(TcpStream::connect(addr).await.unwrap());
        assert_eq!(
            first.receive().await.unwrap(),
            Some(Frame::Welcome {
                id: ParticipantId(1)
            })
        );
        assert_eq!(next_leader(&mut first).await, Some(ParticipantId(1)));
        drop(first);

        let mut second = FrameReader::new(TcpStream::connect(addr).await.unwrap());
        assert_eq!(
            second.receive().await.unwrap(),
            Some(Frame::Welcome {
                id: ParticipantId(2)
            })
        );
        assert_eq!(next_leader(&mut second).await, Some(ParticipantId(2)));
    }
}
