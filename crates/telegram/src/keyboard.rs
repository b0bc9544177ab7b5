use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use fanout_broadcast::SelectionView;

/// Inline keyboard for a selection view: one toggle button per channel, then
/// select/unselect all, then the post button.
pub fn selection_keyboard(view: &SelectionView) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = view
        .action_rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(label, action)| InlineKeyboardButton::callback(label, action.callback_data()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}
