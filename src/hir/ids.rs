//! Arena identifiers for the runtime graph.
//!
//! Nodes, properties and delete directives live in flat arenas owned by the
//! [`Graph`](super::Graph). Parent links and property version chains are
//! stored as these indices, never as references.

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an id from an arena index
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Get the index into the arena
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Identifier of a node in the graph arena.
    NodeId
);
arena_id!(
    /// Identifier of a property (live or superseded) in the graph arena.
    PropertyId
);
arena_id!(
    /// Identifier of a `/delete-node/` or `/delete-property/` directive.
    DirectiveId
);
