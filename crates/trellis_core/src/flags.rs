//! Lifecycle flags threaded through scope creation and property lookup

use bitflags::bitflags;

bitflags! {
    /// Flags that alter how contexts are created and searched
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LifecycleFlags: u32 {
        /// No flags set
        const NONE = 0;
        /// Wrap newly created binding contexts in a change-observing proxy
        const PROXY_STRATEGY = 1 << 0;
        /// The lookup is part of a `$parent` traversal; an exhausted search
        /// yields the boundary marker instead of a default target
        const IS_TRAVERSING_PARENT_SCOPE = 1 << 1;
    }
}
