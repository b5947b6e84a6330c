use kurbo::Rect;

/// Opaque reference to an element (or text unit) living in a host document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(pub usize);

/// Identifies one size observation registered with [`HostSurface::observe_size`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A live vector-graphics document the canvas reflects its node tree onto.
///
/// Every call is an immediate side effect: there is no batching on this side of the
/// boundary. Calls made with a handle the host no longer knows about must be no-ops.
pub trait HostSurface {
    /// Create a detached element named `tag` in `namespace`.
    fn create_element(&mut self, namespace: &str, tag: &str) -> HostHandle;

    /// Create a detached raw text unit.
    fn create_text(&mut self, text: &str) -> HostHandle;

    fn set_attribute(&mut self, el: HostHandle, namespace: Option<&str>, name: &str, value: &str);

    fn remove_attribute(&mut self, el: HostHandle, namespace: Option<&str>, name: &str);

    fn attribute(&self, el: HostHandle, namespace: Option<&str>, name: &str) -> Option<String>;

    /// Replace all children of `el` with a single text unit holding `text`.
    fn set_text_content(&mut self, el: HostHandle, text: &str);

    /// Append `child` as the last child of `parent`, detaching it from any previous parent.
    fn append_child(&mut self, parent: HostHandle, child: HostHandle);

    /// Insert `child` under `parent` immediately before `reference`.
    ///
    /// Falls back to appending when `reference` is not a child of `parent`.
    fn insert_before(&mut self, parent: HostHandle, child: HostHandle, reference: HostHandle);

    /// Detach `el` from its parent. The element stays alive and can be re-inserted.
    fn detach(&mut self, el: HostHandle);

    /// Tear down a detached element. The handle is invalid afterwards.
    fn release(&mut self, el: HostHandle);

    fn parent(&self, el: HostHandle) -> Option<HostHandle>;

    fn children(&self, el: HostHandle) -> Vec<HostHandle>;

    /// Rendered geometry of `el` in its own user space.
    ///
    /// `None` when the element is not connected to a rendered document or cannot be
    /// measured yet.
    fn bounding_box(&self, el: HostHandle) -> Option<Rect>;

    /// Start reporting geometry changes of `el`.
    fn observe_size(&mut self, el: HostHandle) -> SubscriptionId;

    fn unobserve(&mut self, id: SubscriptionId);

    /// Drain the observations whose target changed size since the last call.
    fn take_geometry_changes(&mut self) -> Vec<SubscriptionId>;
}

/// A size observation that must be cancelled explicitly.
///
/// Observations do not go away with their target element, so whoever holds one is
/// responsible for calling [`Subscription::cancel`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an uncancelled subscription keeps firing"]
pub struct Subscription {
    id: SubscriptionId,
    target: HostHandle,
}

impl Subscription {
    pub fn observe(host: &mut dyn HostSurface, target: HostHandle) -> Self {
        let id = host.observe_size(target);
        Self { id, target }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn target(&self) -> HostHandle {
        self.target
    }

    pub fn cancel(self, host: &mut dyn HostSurface) {
        host.unobserve(self.id);
    }
}
