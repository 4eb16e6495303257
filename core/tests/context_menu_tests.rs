// tests/context_menu_tests.rs
mod common;

use common::*;
use flowdeck::registry::context_menu::{cleanup_separators, merge_menu_items, DISABLE_ALL};
use flowdeck::{ContextMenuConfig, ContextMenuItem, MenuTarget};
use proptest::prelude::*;

fn item(id: &str) -> ContextMenuItem {
  ContextMenuItem::action(id, id, format!("custom:{}", id))
}

/// Item ids with separators rendered as `|`.
fn layout(items: &[ContextMenuItem]) -> Vec<String> {
  items
    .iter()
    .map(|i| if i.is_separator() { "|".to_string() } else { i.id.clone() })
    .collect()
}

fn with_defaults() -> std::sync::Arc<flowdeck::Registries> {
  let registries = registries();
  registries.context_menus.register_defaults();
  registries
}

#[test]
fn test_general_menu_without_specific() {
  let registries = with_defaults();
  assert_eq!(
    layout(&registries.context_menus.node_menu("task")),
    vec!["properties", "appearance", "|", "duplicate", "|", "delete"]
  );
  assert_eq!(layout(&registries.context_menus.edge_menu("sequence")), vec!["properties", "|", "delete"]);
  assert!(registries.context_menus.canvas_menu().is_empty());
}

#[test]
fn test_specific_items_insert_before_properties() {
  let registries = with_defaults();
  registries.context_menus.register_menu(ContextMenuConfig::for_types(
    "mail-menu",
    MenuTarget::Node,
    vec!["sendEmailTask".to_string()],
    vec![item("sendNow"), item("preview")],
  ));

  assert_eq!(
    layout(&registries.context_menus.node_menu("sendEmailTask")),
    vec!["sendNow", "preview", "|", "properties", "appearance", "|", "duplicate", "|", "delete"]
  );
  assert_eq!(registries.context_menus.node_menu("task").len(), 6, "other types keep the general menu");
}

#[test]
fn test_separator_fence_before_anchor_in_the_middle() {
  let general = vec![item("copy"), item("properties"), item("delete")];
  let merged = merge_menu_items(&general, &[item("custom")], &[]);
  assert_eq!(layout(&merged), vec!["copy", "|", "custom", "|", "properties", "delete"]);
  assert_eq!(merged[1].id, "separator-before-custom");
  assert_eq!(merged[3].id, "separator-after-custom");
}

#[test]
fn test_disabled_defaults_are_removed_and_separators_cleaned() {
  let registries = with_defaults();
  registries.context_menus.register_menu(
    ContextMenuConfig::for_types("locked", MenuTarget::Node, vec!["locked".to_string()], vec![item("unlock")])
      .with_disabled_defaults(vec!["duplicate".to_string(), "appearance".to_string()]),
  );

  assert_eq!(
    layout(&registries.context_menus.node_menu("locked")),
    vec!["unlock", "|", "properties", "|", "delete"]
  );
}

#[test]
fn test_disable_all_leaves_only_specific_items() {
  let general = flowdeck::registry::context_menu::default_node_menu().items;
  let merged = merge_menu_items(&general, &[item("a"), item("b")], &[DISABLE_ALL.to_string()]);
  assert_eq!(layout(&merged), vec!["a", "b"]);
}

#[test]
fn test_specific_menu_with_reserved_item_replaces_general() {
  let general = flowdeck::registry::context_menu::default_node_menu().items;
  let specific = vec![item("delete"), ContextMenuItem::separator("s"), item("archive")];
  let merged = merge_menu_items(&general, &specific, &["all".to_string()]);
  assert_eq!(merged, specific);
}

#[test]
fn test_register_menu_truncates_deep_submenus() {
  let registries = registries();
  let mut tree = item("leaf");
  for depth in 0..12 {
    tree = item(&format!("level-{}", depth)).with_submenu(vec![tree]);
  }
  registries
    .context_menus
    .register_menu(ContextMenuConfig::general("deep", MenuTarget::Canvas, vec![tree]));

  let menu = registries.context_menus.canvas_menu();
  assert_eq!(menu.len(), 1);
  assert_eq!(menu[0].depth(), flowdeck::registry::context_menu::MAX_SUBMENU_DEPTH);
  assert_eq!(
    registries.context_menus.get("deep").map(|i| i.item_type),
    Some("canvas:general".to_string())
  );
}

fn menu_strategy(ids: &'static [&'static str]) -> impl Strategy<Value = Vec<ContextMenuItem>> {
  prop::collection::vec((any::<bool>(), 0..ids.len()), 0..12).prop_map(move |entries| {
    entries
      .into_iter()
      .enumerate()
      .map(|(pos, (separator, idx))| {
        if separator {
          ContextMenuItem::separator(format!("sep-{}", pos))
        } else {
          item(ids[idx])
        }
      })
      .collect()
  })
}

fn separators_are_well_placed(items: &[ContextMenuItem]) -> bool {
  let leading = items.first().is_some_and(ContextMenuItem::is_separator);
  let trailing = items.last().is_some_and(ContextMenuItem::is_separator);
  let doubled = items.windows(2).any(|w| w[0].is_separator() && w[1].is_separator());
  !leading && !trailing && !doubled
}

proptest! {
  #[test]
  fn cleanup_keeps_every_action_in_order(items in menu_strategy(&["a", "b", "c", "d"])) {
    let actions: Vec<String> = items.iter().filter(|i| !i.is_separator()).map(|i| i.id.clone()).collect();
    let cleaned = cleanup_separators(items);
    prop_assert!(separators_are_well_placed(&cleaned));
    let kept: Vec<String> = cleaned.iter().filter(|i| !i.is_separator()).map(|i| i.id.clone()).collect();
    prop_assert_eq!(kept, actions);
  }

  #[test]
  fn merged_menus_never_have_stray_separators(
    general in menu_strategy(&["properties", "appearance", "duplicate", "delete", "copy"]),
    specific in menu_strategy(&["x", "y", "z"]),
    disable_duplicate in any::<bool>()
  ) {
    let disabled = if disable_duplicate { vec!["duplicate".to_string()] } else { Vec::new() };
    let merged = merge_menu_items(&general, &specific, &disabled);
    prop_assert!(separators_are_well_placed(&merged));
    for custom in specific.iter().filter(|i| !i.is_separator()) {
      prop_assert!(merged.iter().any(|m| m.id == custom.id));
    }
    if disable_duplicate {
      prop_assert!(merged.iter().all(|m| m.id != "duplicate"));
    }
  }
}
