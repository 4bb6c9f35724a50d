//! Widget identity: descriptors of intended targets, snapshots of live nodes, the
//! structural fingerprint that ties them together and the matching service that
//! resolves one against the other.

pub mod descriptor;
pub mod fingerprint;
pub mod matcher;
pub mod node;
pub mod similarity;
pub mod tree;

pub use descriptor::{Attribute, WidgetDescriptor};
pub use fingerprint::{compute_fingerprint, Fingerprint};
pub use matcher::{find_candidates_in, MatchingService};
pub use node::ConcreteNode;
pub use similarity::is_similar;
pub use tree::{Bounds, NodeHandle, NodeIndex, UiNode, UiTree};
