use helpers::history::History;
use helpers::participant_id::{ParticipantId, Term};
use helpers::protocol::{FrameReader, FrameWriter, ProtocolError};
use helpers::Frame;
use log::{debug, warn};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;

use super::Inbox;
use crate::error::SessionError;
use crate::leader_election::{Broadcast, ElectionService, SessionLink};

/// Connection to a hub, split into the link the participant talks through
/// and the reader that feeds its inbox.
pub struct TcpSession {
    pub link: TcpLink,
    pub reader: FrameReader<OwnedReadHalf>,
}

impl TcpSession {
    /// Connects and waits for the hub to assign an id.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, SessionError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = FrameReader::new(read_half);

        let id = match reader.receive().await? {
            Some(Frame::Welcome { id }) => id,
            other => return Err(SessionError::Handshake(other)),
        };

        let (outbox, pending) = mpsc::unbounded_channel();
        actix_rt::spawn(write_frames(FrameWriter::new(write_half), pending));

        Ok(Self {
            link: TcpLink { id, outbox },
            reader,
        })
    }
}

async fn write_frames(mut writer: FrameWriter<OwnedWriteHalf>, mut pending: mpsc::UnboundedReceiver<Frame>) {
    while let Some(frame) = pending.recv().await {
        if let Err(e) = writer.send(&frame).await {
            warn!("[SESSION] cannot write to hub: {}", e);
            break;
        }
    }
}

/// Feeds everything the hub sends into `inbox` until the hub hangs up.
pub async fn forward(mut reader: FrameReader<OwnedReadHalf>, inbox: Inbox) -> Result<(), ProtocolError> {
    while let Some(frame) = reader.receive().await? {
        debug!("[SESSION] received {:?}", frame);
        inbox.deliver(frame);
    }
    Ok(())
}

pub struct TcpLink {
    id: ParticipantId,
    outbox: mpsc::UnboundedSender<Frame>,
}

impl TcpLink {
    fn send(&self, frame: Frame) {
        // The reader side notices a dead hub and stops the participant.
        if self.outbox.send(frame).is_err() {
            warn!("[SESSION] hub connection is closed");
        }
    }
}

impl ElectionService for TcpLink {
    fn request_status(&self) {
        self.send(Frame::ElectionStatusRequested);
    }
}

impl Broadcast for TcpLink {
    fn broadcast(&self, term: Term, history: History) {
        self.send(Frame::Publish { term, history });
    }
}

impl SessionLink for TcpLink {
    fn id(&self) -> ParticipantId {
        self.id
    }
}
