//! Status state machines for financial documents.
//!
//! Each status enum lists, per state, the states it may move to. A state
//! with no outgoing transitions is terminal.

use std::fmt::{Debug, Display};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait Lifecycle:
    Copy + Eq + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// State every new document starts in.
    const INITIAL: Self;

    /// Every state, in lifecycle order.
    fn all() -> &'static [Self];

    /// States reachable from `self` in one step.
    fn allowed_targets(self) -> &'static [Self];

    /// Whether entering this state stamps the document's sent date.
    fn is_sent(self) -> bool;

    fn can_transition(
        self,
        to: Self,
    ) -> bool {
        self.allowed_targets().contains(&to)
    }

    fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }
}
