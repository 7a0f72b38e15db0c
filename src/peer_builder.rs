use std::io;

use tokio::process::Command;

use crate::{Client, MemoryTransport, Peer, PeerOptions, Server, StreamTransport};

impl Peer {
    /// Two peers connected to each other in memory.
    pub fn new_channel(options: &PeerOptions) -> (Peer, Peer) {
        let (t0, t1) = MemoryTransport::pair();
        (Peer::new(t0, options), Peer::new(t1, options))
    }

    pub fn from_stdio(options: &PeerOptions) -> Peer {
        Peer::new(StreamTransport::stdio(), options)
    }

    /// Spawns `command` and speaks newline-delimited JSON-RPC over its stdio.
    pub fn from_command(command: &mut Command, options: &PeerOptions) -> io::Result<Peer> {
        Ok(Peer::new(StreamTransport::from_command(command)?, options))
    }
}

impl Client {
    pub fn from_command(command: &mut Command, options: &PeerOptions) -> io::Result<Client> {
        Ok(Client::new(StreamTransport::from_command(command)?, options))
    }
}

impl Server {
    pub fn from_stdio(options: &PeerOptions) -> Server {
        Server::new(StreamTransport::stdio(), options)
    }
}
