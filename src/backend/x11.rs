//! X11 window backend using x11rb

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    self, Atom, AtomEnum, ConnectionExt, EventMask, GrabMode, GrabStatus, PropMode, Window,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{RequestFailed, TreeNode, WindowBackend, WindowInfo};
use crate::core::request::WindowId;

/// XC_crosshair from the standard cursor font
const XC_CROSSHAIR: u16 = 34;

/// X11 window backend
pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    atoms: X11Atoms,
    interned: Mutex<HashMap<String, Atom>>,
}

/// Atoms needed for window lookup
struct X11Atoms {
    net_active_window: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
}

impl X11Backend {
    /// Connect to the given display
    pub fn new(display: &str) -> anyhow::Result<Self> {
        let (conn, screen_num) = RustConnection::connect(Some(display))?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;

        let atoms = Self::intern_atoms(&conn)?;

        Ok(Self {
            conn,
            root,
            atoms,
            interned: Mutex::new(HashMap::new()),
        })
    }

    fn intern_atoms(conn: &RustConnection) -> anyhow::Result<X11Atoms> {
        let net_active_window = conn.intern_atom(false, b"_NET_ACTIVE_WINDOW")?.reply()?.atom;
        let net_wm_name = conn.intern_atom(false, b"_NET_WM_NAME")?.reply()?.atom;
        let utf8_string = conn.intern_atom(false, b"UTF8_STRING")?.reply()?.atom;

        Ok(X11Atoms {
            net_active_window,
            net_wm_name,
            utf8_string,
        })
    }

    /// Intern a property name, remembering the result for later requests
    fn atom(&self, name: &str) -> anyhow::Result<Atom> {
        let mut interned = self
            .interned
            .lock()
            .map_err(|_| anyhow::anyhow!("atom cache poisoned"))?;

        if let Some(atom) = interned.get(name) {
            return Ok(*atom);
        }

        let atom = self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom;
        interned.insert(name.to_string(), atom);
        Ok(atom)
    }

    fn get_window_property(&self, window: Window, property: Atom, type_: Atom) -> anyhow::Result<Option<Vec<u8>>> {
        let reply = self.conn.get_property(
            false,
            window,
            property,
            type_,
            0,
            u32::MAX,
        )?.reply()?;

        if reply.value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(reply.value))
        }
    }

    fn get_window_title(&self, window: Window) -> anyhow::Result<Option<String>> {
        // Try _NET_WM_NAME first (UTF-8)
        if let Some(data) = self.get_window_property(window, self.atoms.net_wm_name, self.atoms.utf8_string)? {
            if let Ok(s) = String::from_utf8(data) {
                return Ok(Some(s));
            }
        }

        // Fall back to WM_NAME, which is Latin-1 in practice
        Ok(self
            .get_window_property(window, AtomEnum::WM_NAME.into(), AtomEnum::STRING.into())?
            .map(|data| data.iter().map(|&b| b as char).collect()))
    }

    fn pick_window_blocking(&self) -> anyhow::Result<Window> {
        let font = self.conn.generate_id()?;
        self.conn.open_font(font, b"cursor")?;

        let cursor = self.conn.generate_id()?;
        self.conn.create_glyph_cursor(
            cursor,
            font,
            font,
            XC_CROSSHAIR,
            XC_CROSSHAIR + 1,
            0, 0, 0,
            0xFFFF, 0xFFFF, 0xFFFF,
        )?;

        let grab = self.conn.grab_pointer(
            false,
            self.root,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
            GrabMode::SYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            cursor,
            x11rb::CURRENT_TIME,
        )?.reply()?;

        if grab.status != GrabStatus::SUCCESS {
            self.release_cursor(font, cursor)?;
            anyhow::bail!("cannot grab the pointer ({:?})", grab.status);
        }

        // Keep the grab until every button is up so the click does not
        // reach the window underneath
        let mut picked = None;
        let mut buttons_down: u32 = 0;
        while picked.is_none() || buttons_down > 0 {
            self.conn.allow_events(xproto::Allow::SYNC_POINTER, x11rb::CURRENT_TIME)?;
            self.conn.flush()?;

            match self.conn.wait_for_event()? {
                Event::ButtonPress(event) => {
                    if picked.is_none() {
                        // A click on the desktop has no child
                        picked = Some(if event.child == x11rb::NONE { self.root } else { event.child });
                    }
                    buttons_down += 1;
                }
                Event::ButtonRelease(_) => buttons_down = buttons_down.saturating_sub(1),
                _ => {}
            }
        }

        self.conn.ungrab_pointer(x11rb::CURRENT_TIME)?;
        self.release_cursor(font, cursor)?;

        let Some(window) = picked else {
            anyhow::bail!("pointer grab ended without a selection");
        };
        tracing::debug!("Picked window 0x{:x}", window);
        Ok(window)
    }

    fn release_cursor(&self, font: xproto::Font, cursor: xproto::Cursor) -> anyhow::Result<()> {
        self.conn.free_cursor(cursor)?;
        self.conn.close_font(font)?;
        self.conn.flush()?;
        Ok(())
    }
}

/// Surface the protocol error code of a rejected request
fn rejected(request: &'static str, err: ReplyError) -> anyhow::Error {
    match err {
        ReplyError::X11Error(x11_error) => RequestFailed {
            request,
            code: x11_error.error_code,
        }
        .into(),
        other => other.into(),
    }
}

#[async_trait]
impl WindowBackend for X11Backend {
    fn root(&self) -> WindowId {
        self.root
    }

    async fn get_cardinal(&self, window: WindowId, property: &str) -> anyhow::Result<Option<u32>> {
        let atom = self.atom(property)?;
        let reply = self.conn.get_property(
            false,
            window,
            atom,
            AtomEnum::CARDINAL,
            0,
            1,
        )?.reply()?;

        Ok(reply.value32().and_then(|mut values| values.next()))
    }

    async fn set_cardinal(&self, window: WindowId, property: &str, value: u32) -> anyhow::Result<()> {
        let atom = self.atom(property)?;
        self.conn
            .change_property32(PropMode::REPLACE, window, atom, AtomEnum::CARDINAL, &[value])?
            .check()
            .map_err(|e| rejected("ChangeProperty", e))?;

        tracing::debug!("Set {} on 0x{:x} to {}", property, window, value);
        Ok(())
    }

    async fn remove_property(&self, window: WindowId, property: &str) -> anyhow::Result<()> {
        let atom = self.atom(property)?;
        self.conn
            .delete_property(window, atom)?
            .check()
            .map_err(|e| rejected("DeleteProperty", e))?;

        tracing::debug!("Removed {} from 0x{:x}", property, window);
        Ok(())
    }

    async fn window_info(&self, window: WindowId) -> anyhow::Result<WindowInfo> {
        let tree = self.conn.query_tree(window)?.reply()?;

        Ok(WindowInfo {
            parent: (tree.parent != x11rb::NONE).then_some(tree.parent),
            is_root: window == tree.root,
        })
    }

    async fn window_name(&self, window: WindowId) -> anyhow::Result<Option<String>> {
        self.get_window_title(window)
    }

    async fn enumerate_tree(&self) -> anyhow::Result<Vec<TreeNode>> {
        let top = self.conn.query_tree(self.root)?.reply()?;

        let mut nodes = Vec::new();
        let mut stack: Vec<TreeNode> = top
            .children
            .iter()
            .rev()
            .map(|&id| TreeNode { id, parent: self.root })
            .collect();

        while let Some(node) = stack.pop() {
            nodes.push(node);

            // Windows can be destroyed while we walk
            let Ok(subtree) = self.conn.query_tree(node.id)?.reply() else {
                continue;
            };
            stack.extend(
                subtree
                    .children
                    .iter()
                    .rev()
                    .map(|&id| TreeNode { id, parent: node.id }),
            );
        }

        tracing::debug!("Tree snapshot holds {} windows", nodes.len());
        Ok(nodes)
    }

    async fn active_window(&self) -> anyhow::Result<Option<WindowId>> {
        let reply = self.conn.get_property(
            false,
            self.root,
            self.atoms.net_active_window,
            AtomEnum::WINDOW,
            0,
            1,
        )?.reply()?;

        Ok(reply
            .value32()
            .and_then(|mut values| values.next())
            .filter(|&window| window != x11rb::NONE))
    }

    async fn pick_window(&self) -> anyhow::Result<WindowId> {
        self.pick_window_blocking()
    }
}
