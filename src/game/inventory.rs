//! Inventory engine: stacking, equipping and shop pricing over a character's item list.
//!
//! Every function works on values the caller owns. Nothing here touches the
//! entity store; `service` decides when the results get committed.
use log::debug;

use super::errors::{GameError, GameResult};
use super::types::{Character, Item};

/// Outcome of a single inventory mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryResult {
    /// Item added; `stacked` is true when it merged into an existing entry
    Added { quantity: u32, stacked: bool },
    /// Units removed; `dropped` is true when the entry left the inventory
    Removed { quantity: u32, dropped: bool },
    /// Nothing matched, inventory unchanged
    Unchanged,
}

// ============================================================================
// Inventory Operations
// ============================================================================

/// Add an item. Stackable items merge into an existing stackable entry with the
/// same id; anything else becomes a new entry, even when the id repeats.
pub fn add_item(inventory: &mut Vec<Item>, item: Item) -> InventoryResult {
    let units = item.units();

    if let Some(incoming) = item.quantity {
        if let Some(existing) = inventory
            .iter_mut()
            .find(|entry| entry.id == item.id && entry.quantity.is_some())
        {
            let current = existing.quantity.unwrap_or(0);
            existing.quantity = Some(current.saturating_add(incoming));
            return InventoryResult::Added {
                quantity: units,
                stacked: true,
            };
        }
    }

    inventory.push(item);
    InventoryResult::Added {
        quantity: units,
        stacked: false,
    }
}

/// Remove `quantity` units from the first entry with `item_id`.
///
/// An entry without a quantity counts as one unit. Entries that reach zero are
/// dropped. A missing id is a no-op.
pub fn remove_item(inventory: &mut Vec<Item>, item_id: &str, quantity: u32) -> InventoryResult {
    let Some(index) = inventory.iter().position(|entry| entry.id == item_id) else {
        return InventoryResult::Unchanged;
    };

    let held = inventory[index].units();
    if quantity >= held {
        inventory.remove(index);
        InventoryResult::Removed {
            quantity: held,
            dropped: true,
        }
    } else {
        inventory[index].quantity = Some(held - quantity);
        InventoryResult::Removed {
            quantity,
            dropped: false,
        }
    }
}

fn set_equipped(inventory: &mut [Item], item_id: &str, equipped: bool) -> GameResult<()> {
    let entry = inventory
        .iter_mut()
        .find(|entry| entry.id == item_id)
        .ok_or_else(|| GameError::NotFound(format!("item: {}", item_id)))?;
    entry.is_equipped = Some(equipped);
    Ok(())
}

/// Mark an item equipped. There are no slots, so any number of items may be equipped.
pub fn equip_item(inventory: &mut [Item], item_id: &str) -> GameResult<()> {
    set_equipped(inventory, item_id, true)
}

pub fn unequip_item(inventory: &mut [Item], item_id: &str) -> GameResult<()> {
    set_equipped(inventory, item_id, false)
}

/// Gold credited for selling one unit.
pub fn sell_price(item: &Item) -> u64 {
    item.value / 2
}

/// Buy `item` for its full value. Returns false and changes nothing when the
/// character cannot afford it.
pub fn buy_item(character: &mut Character, inventory: &mut Vec<Item>, item: Item) -> bool {
    if character.gold < item.value {
        debug!(
            "buy rejected: {} costs {}, {} has {}",
            item.id, item.value, character.user_id, character.gold
        );
        return false;
    }
    character.gold -= item.value;
    add_item(inventory, item);
    true
}

/// Sell one unit of `item_id` for half its value, rounded down.
pub fn sell_item(character: &mut Character, inventory: &mut Vec<Item>, item_id: &str) -> bool {
    let Some(item) = inventory.iter().find(|entry| entry.id == item_id) else {
        return false;
    };
    let credit = sell_price(item);
    character.gold = character.gold.saturating_add(credit);
    remove_item(inventory, item_id, 1);
    true
}

pub fn find_item<'a>(inventory: &'a [Item], item_id: &str) -> Option<&'a Item> {
    inventory.iter().find(|entry| entry.id == item_id)
}

/// Total units held under `item_id`, across every entry.
pub fn item_quantity(inventory: &[Item], item_id: &str) -> u32 {
    inventory
        .iter()
        .filter(|entry| entry.id == item_id)
        .map(Item::units)
        .sum()
}

pub fn equipped_items(inventory: &[Item]) -> impl Iterator<Item = &Item> {
    inventory.iter().filter(|entry| entry.equipped())
}

/// Format inventory for display, one entry per line
pub fn format_inventory(inventory: &[Item]) -> Vec<String> {
    if inventory.is_empty() {
        return vec!["Empty".to_string()];
    }

    let mut lines = Vec::new();
    for (idx, item) in inventory.iter().enumerate() {
        let qty_str = match item.quantity {
            Some(q) => format!("{}x ", q),
            None => String::new(),
        };
        let equip_str = if item.equipped() { " [E]" } else { "" };
        lines.push(format!(
            "{}. {}{} ({}g){}",
            idx + 1,
            qty_str,
            item.name,
            item.value,
            equip_str
        ));
    }
    let units: u32 = inventory.iter().map(Item::units).sum();
    lines.push(format!("Total: {} entries, {} units", inventory.len(), units));
    lines
}

// ============================================================================
// Unit Tests
// ============================================================================
