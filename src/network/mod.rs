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
//! The simulated network: an arena of hosts and links laid out as an implicit binary heap.
//!
//! ```text
//! hosts = [sender, router_1, router_2, router_3, receiver_1, receiver_2, receiver_3, receiver_4]
//!             ^        ^         ^         ^          ^           ^           ^           ^
//! links = [  ctl,    s->r1,   r1->r2,   r1->r3,    r2->rv1,    r2->rv2,    r3->rv3,    r3->rv4 ]
//! ```
//!
//! The link at index `i` is the incoming link of the host at index `i`. Link 0 connects the
//! experiment control to the sender and never drops. The sender has the single child `1`, every
//! router `i` has the children `2i` and `2i + 1`, and the second half of the arrays holds the
//! receivers.

use std::{fmt::Write, ops::Range};

mod host;
mod link;
mod packet;

pub use host::{Host, Role};
pub use link::Link;
pub use packet::Packet;

#[derive(Debug, Clone)]
pub struct Network {
    hosts: Vec<Host>,
    links: Vec<Link>,
}

impl Network {
    /// Assemble a network from its (already wired) parts.
    pub(crate) fn from_parts(hosts: Vec<Host>, links: Vec<Link>) -> Self {
        assert_eq!(
            hosts.len(),
            links.len(),
            "hosts and links must have the same length"
        );
        assert!(
            hosts.len() >= 4 && hosts.len().is_power_of_two(),
            "the arena must describe a complete binary tree"
        );
        assert_eq!(links[0].alpha(), 0.0, "the control link must never drop");
        Self { hosts, links }
    }

    pub fn num_receivers(&self) -> usize {
        self.hosts.len() / 2
    }

    pub fn num_hosts(&self) -> usize {
        self.hosts.len()
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn host(&self, index: usize) -> &Host {
        &self.hosts[index]
    }

    pub fn link(&self, index: usize) -> &Link {
        &self.links[index]
    }

    pub fn host_by_name(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name() == name)
    }

    /// Mutable access to both arrays at once, as needed by the tick loop.
    pub(crate) fn split_mut(&mut self) -> (&mut [Host], &mut [Link]) {
        (&mut self.hosts, &mut self.links)
    }

    /// Heap indices of the sender and the routers.
    pub fn internal(&self) -> Range<usize> {
        0..self.num_receivers()
    }

    /// Heap indices of the receivers.
    pub fn receivers(&self) -> Range<usize> {
        self.num_receivers()..self.num_hosts()
    }

    pub fn is_receiver(&self, index: usize) -> bool {
        index >= self.num_receivers()
    }

    /// Parent of a host. The sender has no parent, and the parent of `router_1` is the sender.
    pub fn parent(&self, index: usize) -> Option<usize> {
        match index {
            0 => None,
            1 => Some(0),
            i => Some(i / 2),
        }
    }

    /// Links traversed by a probe from the sender down to `index`, in order. The control link is
    /// not part of any path.
    pub fn path(&self, index: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = index;
        while current > 0 {
            path.push(current);
            current /= 2;
        }
        path.reverse();
        path
    }

    /// Probability that a probe reaches `index` from the sender, according to the configured
    /// drop probabilities.
    pub fn path_success(&self, index: usize) -> f64 {
        self.path(index)
            .into_iter()
            .map(|l| 1.0 - self.links[l].alpha())
            .product()
    }

    /// Forget all packets of the current tick and allow the sender to send again.
    pub(crate) fn finish_tick(&mut self) {
        self.hosts.iter_mut().for_each(Host::clear);
        self.hosts[0].rearm();
    }

    /// Graphviz description of the tree. Every edge is labelled (and weighted) with the drop
    /// probability of the link it represents. Render with `dot -Tpng -O <file>`.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph {\n");
        for host in &self.hosts[..self.num_receivers()] {
            for child in host.children() {
                let alpha = self.links[*child].alpha();
                // writing to a `String` cannot fail
                let _ = writeln!(
                    dot,
                    "\t{} -> {}[label=\"{alpha}\",weight=\"{alpha}\"];",
                    host.name(),
                    self.hosts[*child].name(),
                );
            }
        }
        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::topology::{LinkLossBuilder, TopologyBuilder};

    fn build(n: usize) -> super::Network {
        let mut rng = StdRng::seed_from_u64(0);
        TopologyBuilder::new(n)
            .losses(LinkLossBuilder::new().default_loss(0.1))
            .build(&mut rng)
            .unwrap()
    }

    #[test]
    fn paths() {
        let net = build(4);
        assert_eq!(net.path(0), Vec::<usize>::new());
        assert_eq!(net.path(1), vec![1]);
        assert_eq!(net.path(3), vec![1, 3]);
        assert_eq!(net.path(6), vec![1, 3, 6]);
        assert!((net.path_success(6) - 0.9f64.powi(3)).abs() < 1e-12);
        assert_eq!(net.path_success(0), 1.0);
    }

    #[test]
    fn parents() {
        let net = build(4);
        assert_eq!(net.parent(0), None);
        assert_eq!(net.parent(1), Some(0));
        assert_eq!(net.parent(2), Some(1));
        assert_eq!(net.parent(3), Some(1));
        assert_eq!(net.parent(7), Some(3));
        for i in 1..net.num_hosts() {
            let parent = net.parent(i).unwrap();
            assert!(net.host(parent).children().contains(&i));
        }
    }

    #[test]
    fn ranges() {
        let net = build(8);
        assert_eq!(net.internal(), 0..8);
        assert_eq!(net.receivers(), 8..16);
        assert!(net.is_receiver(8));
        assert!(!net.is_receiver(7));
        assert_eq!(net.host_by_name("receiver_1").unwrap().index(), 8);
        assert!(net.host_by_name("router_8").is_none());
    }

    #[test]
    fn graphviz() {
        let net = build(2);
        assert_eq!(
            net.to_dot(),
            "digraph {\n\
             \tsender -> router_1[label=\"0.1\",weight=\"0.1\"];\n\
             \trouter_1 -> receiver_1[label=\"0.1\",weight=\"0.1\"];\n\
             \trouter_1 -> receiver_2[label=\"0.1\",weight=\"0.1\"];\n\
             }\n"
        );
        // one edge per non-control link
        let net = build(16);
        assert_eq!(net.to_dot().matches("->").count(), 31);
    }
}
