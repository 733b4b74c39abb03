// TOMO: Network Loss Tomography Simulation with Bernoulli Losses
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Link, Packet};
use crate::Tick;

/// Role of a host in the tree. The role determines how many downstream links a host has and when
/// it forwards a packet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Root of the tree. Originates one probe per tick on its single downstream link.
    Sender,
    /// Internal node. Copies every received probe onto both downstream links.
    Router,
    /// Leaf. Never forwards, only observes.
    Receiver,
}

impl Role {
    /// Number of downstream links a host of this role must be wired to.
    pub fn num_children(&self) -> usize {
        match self {
            Self::Sender => 1,
            Self::Router => 2,
            Self::Receiver => 0,
        }
    }
}

/// A node of the tree, addressed by its heap index.
#[derive(Debug, Clone)]
pub struct Host {
    name: String,
    index: usize,
    role: Role,
    /// Heap indices of the downstream hosts (and thus of the downstream links).
    children: Vec<usize>,
    ready_to_send: bool,
    inbox: Option<Packet>,
    received: u64,
}

impl Host {
    pub fn new(name: impl Into<String>, index: usize, role: Role) -> Self {
        Self {
            name: name.into(),
            index,
            role,
            children: Vec::with_capacity(role.num_children()),
            ready_to_send: role == Role::Sender,
            inbox: None,
            received: 0,
        }
    }

    /// Attach a downstream host.
    pub(crate) fn connect(&mut self, child: usize) {
        assert!(
            self.children.len() < self.role.num_children(),
            "{} ({}) cannot have more than {} children",
            self.name,
            self.role,
            self.role.num_children()
        );
        self.children.push(child);
    }

    /// Forward this tick's probe to all downstream links, where each link decides independently
    /// whether the packet survives. Returns the number of successful deliveries.
    ///
    /// - The sender creates a fresh packet, but only if it is ready to send. Sending disarms it
    ///   until [`Host::rearm`] is called.
    /// - A router forwards copies of the packet it received in this tick, if any.
    /// - A receiver never forwards anything.
    pub fn forward<R: Rng + ?Sized>(&mut self, tick: Tick, links: &mut [Link], rng: &mut R) -> usize {
        let packet = match self.role {
            Role::Sender if self.ready_to_send => {
                self.ready_to_send = false;
                Packet::new(tick)
            }
            Role::Sender => return 0,
            Role::Router => match self.inbox {
                Some(packet) => packet,
                None => return 0,
            },
            Role::Receiver => return 0,
        };

        self.children
            .iter()
            .filter(|child| links[**child].attempt_delivery(packet, rng))
            .count()
    }

    /// Accept a packet delivered by the incoming link.
    pub fn receive(&mut self, packet: Packet) {
        debug_assert!(self.inbox.is_none(), "{} received twice", self.name);
        self.inbox = Some(packet);
        self.received += 1;
    }

    /// Allow the sender to emit the next probe.
    pub fn rearm(&mut self) {
        if self.role == Role::Sender {
            self.ready_to_send = true;
        }
    }

    /// Forget the packet of the current tick.
    pub fn clear(&mut self) {
        self.inbox = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_ready_to_send(&self) -> bool {
        self.ready_to_send
    }

    /// The packet received in the current tick.
    pub fn inbox(&self) -> Option<Packet> {
        self.inbox
    }

    /// Whether the host has seen the probe of the current tick.
    pub fn has_received(&self) -> bool {
        self.inbox.is_some()
    }

    /// Total number of packets received since the start of the run.
    pub fn received(&self) -> u64 {
        self.received
    }
}
