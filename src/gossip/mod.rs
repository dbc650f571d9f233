use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use log::debug;

use crate::blockchain::ChainSnapshot;

/// One participant's view of the mesh: its own inbound queue plus a sender
/// into every peer's queue. Queues are unbounded.
#[derive(Debug)]
pub struct GossipChannel {
    inbound: Receiver<ChainSnapshot>,
    peers: Vec<Sender<ChainSnapshot>>,
    receptions: u64,
}

impl GossipChannel {
    pub fn new(inbound: Receiver<ChainSnapshot>, peers: Vec<Sender<ChainSnapshot>>) -> Self {
        Self {
            inbound,
            peers,
            receptions: 0,
        }
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Take everything queued right now without blocking and keep only the
    /// longest chain (the first one seen wins a tie).
    pub fn drain_inbound(&mut self) -> Option<ChainSnapshot> {
        let mut best: Option<ChainSnapshot> = None;
        loop {
            match self.inbound.try_recv() {
                Ok(chain) => {
                    self.receptions += 1;
                    if best.as_ref().is_none_or(|b| chain.len() > b.len()) {
                        best = Some(chain);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        best
    }

    /// Send `snapshot` to every peer. Peers share the one immutable copy.
    pub fn broadcast(&self, snapshot: &ChainSnapshot) {
        for (i, peer) in self.peers.iter().enumerate() {
            // A finished peer has dropped its receiver; nothing left to tell it.
            if peer.send(ChainSnapshot::clone(snapshot)).is_err() {
                debug!("peer {i} has left the mesh, skipping");
            }
        }
    }

    /// Chains received since the last call; resets the counter.
    pub fn take_receptions(&mut self) -> u64 {
        std::mem::take(&mut self.receptions)
    }
}

/// Wire `n` participants into a full mesh: one inbound queue each, and every
/// endpoint holds senders to the other `n - 1` queues.
pub fn mesh(n: usize) -> Vec<GossipChannel> {
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::channel()).unzip();

    receivers
        .into_iter()
        .enumerate()
        .map(|(i, inbound)| {
            let peers = senders
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, s)| s.clone())
                .collect();
            GossipChannel::new(inbound, peers)
        })
        .collect()
}
