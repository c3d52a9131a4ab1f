//! Role-scoped navigation menus.

mod composer;
mod menu;

pub use composer::{MenuItem, NavComposer};
pub use menu::{ADMIN_MENU, Icon, MenuEntry, STUDENT_MENU, menu_for};
