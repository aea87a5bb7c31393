//! In-memory window tree for exercising the resolver and controller

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{RequestFailed, TreeNode, WindowBackend, WindowInfo};
use crate::core::request::WindowId;

/// BadWindow
const BAD_WINDOW: u8 = 3;
/// BadAccess
const BAD_ACCESS: u8 = 10;

pub struct MemoryBackend {
    root: WindowId,
    /// Depth-first pre-order, like a real tree walk
    nodes: Vec<TreeNode>,
    names: HashMap<WindowId, String>,
    properties: Mutex<HashMap<(WindowId, String), u32>>,
    rejected: HashSet<WindowId>,
    active: Option<WindowId>,
    picked: Option<WindowId>,
    tree_unavailable: bool,
}

impl MemoryBackend {
    pub fn new(root: WindowId) -> Self {
        Self {
            root,
            nodes: Vec::new(),
            names: HashMap::new(),
            properties: Mutex::new(HashMap::new()),
            rejected: HashSet::new(),
            active: None,
            picked: None,
            tree_unavailable: false,
        }
    }

    /// Append a window; parents must be added before their children
    pub fn with_window(mut self, id: WindowId, parent: WindowId) -> Self {
        self.nodes.push(TreeNode { id, parent });
        self
    }

    pub fn with_name(mut self, id: WindowId, name: &str) -> Self {
        self.names.insert(id, name.to_string());
        self
    }

    pub fn with_property(self, id: WindowId, property: &str, value: u32) -> Self {
        self.properties
            .lock()
            .unwrap()
            .insert((id, property.to_string()), value);
        self
    }

    /// Every write or removal on this window fails with BadAccess
    pub fn rejecting(mut self, id: WindowId) -> Self {
        self.rejected.insert(id);
        self
    }

    pub fn with_active(mut self, id: WindowId) -> Self {
        self.active = Some(id);
        self
    }

    pub fn with_picked(mut self, id: WindowId) -> Self {
        self.picked = Some(id);
        self
    }

    pub fn without_tree(mut self) -> Self {
        self.tree_unavailable = true;
        self
    }

    pub fn property(&self, id: WindowId, property: &str) -> Option<u32> {
        self.properties
            .lock()
            .unwrap()
            .get(&(id, property.to_string()))
            .copied()
    }

    fn exists(&self, id: WindowId) -> bool {
        id == self.root || self.nodes.iter().any(|n| n.id == id)
    }

    fn check_writable(&self, id: WindowId, request: &'static str) -> anyhow::Result<()> {
        if !self.exists(id) {
            return Err(RequestFailed { request, code: BAD_WINDOW }.into());
        }
        if self.rejected.contains(&id) {
            return Err(RequestFailed { request, code: BAD_ACCESS }.into());
        }
        Ok(())
    }
}

#[async_trait]
impl WindowBackend for MemoryBackend {
    fn root(&self) -> WindowId {
        self.root
    }

    async fn get_cardinal(&self, window: WindowId, property: &str) -> anyhow::Result<Option<u32>> {
        if !self.exists(window) {
            anyhow::bail!("BadWindow 0x{:x}", window);
        }
        Ok(self.property(window, property))
    }

    async fn set_cardinal(&self, window: WindowId, property: &str, value: u32) -> anyhow::Result<()> {
        self.check_writable(window, "ChangeProperty")?;
        self.properties
            .lock()
            .unwrap()
            .insert((window, property.to_string()), value);
        Ok(())
    }

    async fn remove_property(&self, window: WindowId, property: &str) -> anyhow::Result<()> {
        self.check_writable(window, "DeleteProperty")?;
        self.properties
            .lock()
            .unwrap()
            .remove(&(window, property.to_string()));
        Ok(())
    }

    async fn window_info(&self, window: WindowId) -> anyhow::Result<WindowInfo> {
        if window == self.root {
            return Ok(WindowInfo {
                parent: None,
                is_root: true,
            });
        }
        let node = self
            .nodes
            .iter()
            .find(|n| n.id == window)
            .ok_or_else(|| anyhow::anyhow!("BadWindow 0x{:x}", window))?;
        Ok(WindowInfo {
            parent: Some(node.parent),
            is_root: false,
        })
    }

    async fn window_name(&self, window: WindowId) -> anyhow::Result<Option<String>> {
        Ok(self.names.get(&window).cloned())
    }

    async fn enumerate_tree(&self) -> anyhow::Result<Vec<TreeNode>> {
        if self.tree_unavailable {
            anyhow::bail!("QueryTree failed");
        }
        Ok(self.nodes.clone())
    }

    async fn active_window(&self) -> anyhow::Result<Option<WindowId>> {
        Ok(self.active)
    }

    async fn pick_window(&self) -> anyhow::Result<WindowId> {
        self.picked
            .ok_or_else(|| anyhow::anyhow!("no window was picked"))
    }
}
