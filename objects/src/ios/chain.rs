use super::store::NodeId;

/// The nodes currently being resolved, outermost first.  Resolving a node
/// that is already on the chain is a circular reference.
#[derive(Debug, Clone, Default)]
pub struct ReferenceChain {
    nodes: Vec<NodeId>,

    /// A circular reference on this chain has already been reported
    reported: bool,
}

impl ReferenceChain {
    pub fn new() -> Self {
        Default::default()
    }

    /// Push a node onto the chain.  Returns false, leaving the chain
    /// unchanged, if the node is already being resolved.
    pub fn add(&mut self, node: NodeId) -> bool {
        if self.nodes.contains(&node) {
            log::debug!("circular reference to {node:?} through {:?}", self.nodes);
            return false;
        }

        self.nodes.push(node);
        true
    }

    /// Current depth of the chain, to be passed to `release`
    pub fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Pop every node pushed since `mark` was taken
    pub fn release(&mut self, mark: usize) {
        self.nodes.truncate(mark);
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Should a detected cycle be reported.  Only the first cycle found on a
    /// chain is.
    pub fn should_report(&mut self) -> bool {
        !std::mem::replace(&mut self.reported, true)
    }
}

#[cfg(test)]
mod tests {
    use crate::ios::{ObjectClassId, ObjectSetId};

    use super::*;

    #[test]
    fn detects_repeated_nodes() {
        let mut chain = ReferenceChain::new();
        let class = NodeId::Class(ObjectClassId::ERRONEOUS);
        let set = NodeId::ObjectSet(ObjectSetId::ERRONEOUS);

        assert!(chain.add(class));
        let mark = chain.mark();
        assert!(chain.add(set));
        assert!(!chain.add(class));

        chain.release(mark);
        assert!(!chain.contains(set));
        assert!(chain.add(set));
    }

    #[test]
    fn reports_once_per_chain() {
        let mut chain = ReferenceChain::new();
        assert!(chain.should_report());
        assert!(!chain.should_report());
    }
}
