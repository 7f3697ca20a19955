// Inventory and texture menu state

use crate::scene::{ItemKind, NodeId};

/// Texture choices offered for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureMenu {
    pub target: NodeId,
    pub choices: Vec<String>,
}

/// The two overlay panels. Menus are driven by the digit keys.
#[derive(Debug, Default, Clone)]
pub struct Panels {
    inventory_open: bool,
    texture_menu: Option<TextureMenu>,
}

impl Panels {
    pub fn inventory_open(&self) -> bool {
        self.inventory_open
    }

    /// Flips the inventory and returns whether it is now open.
    pub fn toggle_inventory(&mut self) -> bool {
        self.inventory_open = !self.inventory_open;
        if self.inventory_open {
            let listing: Vec<String> = ItemKind::FURNITURE
                .iter()
                .enumerate()
                .map(|(i, kind)| format!("{}: {}", i + 1, kind.slug()))
                .collect();
            log::info!("Inventory open [{}]", listing.join(", "));
        } else {
            log::info!("Inventory closed");
        }
        self.inventory_open
    }

    /// Item behind the 1-based digit `slot`.
    pub fn inventory_item(&self, slot: usize) -> Option<ItemKind> {
        slot.checked_sub(1)
            .and_then(|i| ItemKind::FURNITURE.get(i))
            .copied()
    }

    #[cfg(test)]
    pub fn texture_menu(&self) -> Option<&TextureMenu> {
        self.texture_menu.as_ref()
    }

    pub fn texture_target(&self) -> Option<NodeId> {
        self.texture_menu.as_ref().map(|menu| menu.target)
    }

    pub fn open_texture_menu(&mut self, target: NodeId, choices: &[String]) {
        let listing: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(i, path)| format!("{}: {}", i + 1, path))
            .collect();
        log::info!("Texture menu [{}]", listing.join(", "));
        self.texture_menu = Some(TextureMenu {
            target,
            choices: choices.to_vec(),
        });
    }

    pub fn close_texture_menu(&mut self) {
        self.texture_menu = None;
    }

    /// Closes the texture menu if it belongs to `id`. Returns true if it did.
    pub fn forget(&mut self, id: NodeId) -> bool {
        if self.texture_target() == Some(id) {
            self.texture_menu = None;
            return true;
        }
        false
    }

    /// Path behind the 1-based digit `slot` of the texture menu.
    pub fn texture_choice(&self, slot: usize) -> Option<&str> {
        let menu = self.texture_menu.as_ref()?;
        menu.choices.get(slot.checked_sub(1)?).map(String::as_str)
    }
}
