//! Reply keyboard with one toggle button per creator.

use serde_json::Value;
use serde_json::json;

use crate::entity::Creator;

/// VK rejects button labels longer than this.
const MAX_LABEL_CHARS: usize = 40;
/// A reply keyboard has at most 10 rows; the last one holds the menu.
const MAX_CREATOR_ROWS: usize = 9;
const MAX_BUTTONS_PER_ROW: usize = 5;

fn button(label: &str, color: &str, payload: Value) -> Value {
    json!({
        "action": {
            "type": "text",
            "label": label.chars().take(MAX_LABEL_CHARS).collect::<String>(),
            "payload": payload.to_string(),
        },
        "color": color,
    })
}

/// Builds the keyboard for a user following `subscribed` creator ids.
///
/// Followed creators are marked ✅ and green, the rest ➕ and grey. Creators
/// are packed into more buttons per row once they no longer fit one per row.
pub fn build_keyboard(creators: &[Creator], subscribed: &[String]) -> Value {
    let per_row = creators
        .len()
        .div_ceil(MAX_CREATOR_ROWS)
        .clamp(1, MAX_BUTTONS_PER_ROW);

    let mut rows: Vec<Value> = creators
        .chunks(per_row)
        .take(MAX_CREATOR_ROWS)
        .map(|chunk| {
            let row: Vec<Value> = chunk
                .iter()
                .map(|creator| {
                    let is_subscribed = subscribed.contains(&creator.id);
                    let (mark, color) = if is_subscribed {
                        ("✅", "positive")
                    } else {
                        ("➕", "secondary")
                    };
                    button(
                        &format!("{mark} {}", creator.name),
                        color,
                        json!({"cmd": "toggle", "sid": creator.id}),
                    )
                })
                .collect();
            Value::Array(row)
        })
        .collect();

    rows.push(json!([
        button("📋 Мои подписки", "primary", json!({"cmd": "mysubs"})),
        button("❌ Отписаться от всех", "negative", json!({"cmd": "unsub_all"})),
    ]));

    json!({
        "one_time": false,
        "buttons": rows,
    })
}
