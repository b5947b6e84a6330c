//! Operations on existing nodes.

use canvas_traits::HostSurface;

use crate::GraphicsContext;
use crate::descriptor::{Content, Descriptor, ElementKind, RawDescriptor};
use crate::error::{Error, Result};
use crate::node::{Attributes, NodeFlags, NodeId};

impl<H: HostSurface> GraphicsContext<H> {
    /// Create a child of `parent`. Text block roots are recorded in the parent's
    /// `composites`, everything else in `children`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: impl Into<ElementKind>,
        attrs: Attributes,
        content: impl Into<Content>,
        insert_before: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        self.create_element(
            kind.into(),
            attrs,
            Some(parent),
            content.into(),
            insert_before,
        )
    }

    /// Create one child of `parent` per descriptor.
    ///
    /// Every descriptor is checked first: if any entry, at any depth, has no type
    /// nothing is created.
    pub fn add_descriptors(
        &mut self,
        parent: NodeId,
        descriptors: Vec<RawDescriptor>,
    ) -> Result<Vec<NodeId>> {
        self.node_or_err(parent)?;
        let descriptors = RawDescriptor::into_descriptors(descriptors)?;
        self.add_typed_descriptors(parent, descriptors)
    }

    /// Typed counterpart of [`GraphicsContext::add_descriptors`].
    pub fn add_typed_descriptors(
        &mut self,
        parent: NodeId,
        descriptors: Vec<Descriptor>,
    ) -> Result<Vec<NodeId>> {
        self.node_or_err(parent)?;
        descriptors.iter().try_for_each(Descriptor::validate)?;

        Ok(descriptors
            .into_iter()
            .filter_map(|descriptor| {
                self.build(
                    descriptor.kind,
                    descriptor.attrs,
                    Some(parent),
                    descriptor.content,
                    None,
                )
            })
            .collect())
    }

    /// Write the given attributes to the node and its host element.
    ///
    /// Attributes that are not mentioned keep their current value on the host.
    pub fn update(&mut self, id: NodeId, attrs: &Attributes) -> Result<()> {
        self.node_or_err(id)?;
        self.apply_attributes(id, attrs);
        Ok(())
    }

    /// Remove every child and composite of `id`.
    pub fn clear(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_or_err(id)?;
        let owned: Vec<NodeId> = node.owned_ids().collect();
        for child in owned {
            self.remove_subtree(child);
        }
        Ok(())
    }

    /// Make the next [`GraphicsContext::replace`] of `id` skip host-order preservation.
    pub fn invalidate(&mut self, id: NodeId) -> Result<()> {
        self.nodes
            .get_mut(id)
            .ok_or(Error::UnknownNode(id))?
            .flags
            .insert(NodeFlags::INVALIDATED);
        Ok(())
    }

    /// Remove `id` and everything below it, from the tree and from the host.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.node_or_err(id)?;
        if id == self.root {
            return Err(Error::RootNode);
        }
        self.remove_subtree(id);
        Ok(())
    }

    /// Swap `target` into the place and identity of `id`.
    ///
    /// Unless `id` is invalidated, `target`'s host element first moves to just before
    /// `id`'s so the visual order is kept. Then `id` is removed and `target`'s payload
    /// moves into `id`'s slot: afterwards `id` names the new content and `target` is
    /// gone.
    pub fn replace(&mut self, id: NodeId, target: NodeId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(Error::UnknownNode(id))?;
        let target_node = self.nodes.get(target).ok_or(Error::UnknownNode(target))?;
        if id == self.root || target == self.root {
            return Err(Error::RootNode);
        }
        if id == target {
            return Ok(());
        }
        if self.is_ancestor(id, target) {
            return Err(Error::ReplaceWithDescendant(target));
        }
        if self.is_ancestor(target, id) {
            return Err(Error::ReplaceWithAncestor(target));
        }

        let parent = node.parent;
        let composite = node.is_text_block();
        let preserve_from = (!node.is_invalidated()).then_some(node.host).flatten();
        let target_handle = target_node.host;
        let parent_handle = parent.and_then(|parent| self.nodes.get(parent)?.host);

        let preserve = match (preserve_from, target_handle, parent_handle) {
            (Some(handle), Some(target_handle), Some(parent_handle)) => {
                self.host.insert_before(parent_handle, target_handle, handle);
                true
            }
            _ => false,
        };

        let old_index = parent.and_then(|parent| {
            let parent = self.nodes.get(parent)?;
            let list = if composite { &parent.composites } else { &parent.children };
            list.iter().position(|child| *child == id)
        });
        let old_target_index = parent.and_then(|parent| {
            let parent = self.nodes.get(parent)?;
            let list = if composite { &parent.composites } else { &parent.children };
            list.iter().position(|child| *child == target)
        });

        self.teardown(id);

        let mut payload = self.nodes.remove(target);
        payload.id = id;
        if payload.insert_before == Some(id) {
            payload.insert_before = None;
        }
        for child in payload.owned_ids() {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = Some(id);
            }
        }
        if let Some(block) = payload.text_block {
            if let Some(block) = self.text_blocks.get_mut(block) {
                block.root = id;
            }
        }

        let target_composite = payload.text_block.is_some();
        if preserve {
            // The host element now sits in `id`'s old slot, so the tree follows it there.
            if let Some(target_parent) = payload.parent.and_then(|p| self.nodes.get_mut(p)) {
                target_parent.children.retain(|child| *child != target);
                target_parent.composites.retain(|child| *child != target);
            }
            let same_list = payload.parent == parent && target_composite == composite;
            payload.parent = parent;
            if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
                let list = if target_composite {
                    &mut parent.composites
                } else {
                    &mut parent.children
                };
                let index = match (old_index, old_target_index) {
                    (Some(old), Some(target_index)) if same_list && target_index < old => old - 1,
                    (Some(old), _) => old,
                    (None, _) => list.len(),
                };
                list.insert(index.min(list.len()), id);
            }
        } else if let Some(target_parent) = payload.parent.and_then(|p| self.nodes.get_mut(p)) {
            let list = if target_composite {
                &mut target_parent.composites
            } else {
                &mut target_parent.children
            };
            for child in list.iter_mut().filter(|child| **child == target) {
                *child = id;
            }
        }

        for node in self.nodes.iter_mut().map(|(_, node)| node) {
            if node.insert_before == Some(target) {
                node.insert_before = Some(id);
            }
        }

        self.forget_shadow(target);
        self.nodes[id] = payload;
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut current = self.nodes.get(of).and_then(|node| node.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        false
    }

    /// Postorder removal: children first, then the node leaves the host and its parent.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) {
        if !self.nodes.contains(id) {
            return;
        }
        self.teardown(id);
        self.nodes.remove(id);
    }

    /// Everything [`GraphicsContext::remove_subtree`] does except freeing the slot.
    fn teardown(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let owned: Vec<NodeId> = node
            .children
            .drain(..)
            .chain(node.composites.drain(..))
            .collect();
        for child in owned {
            self.remove_subtree(child);
        }

        let node = &mut self.nodes[id];
        let parent = node.parent.take();
        let handle = node.host.take();
        let block = node.text_block.take();

        if let Some(block) = block {
            self.drop_text_block(block);
        }
        if let Some(handle) = handle {
            self.host.detach(handle);
            self.host.release(handle);
        }
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
            parent.composites.retain(|child| *child != id);
        }
        self.forget_shadow(id);
    }
}
