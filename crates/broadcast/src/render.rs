//! Selection Renderer: a pure projection of a session snapshot.

use crate::{actions::Action, channel::ChannelList, session::Snapshot};

pub const ALL_SELECTED_TEXT: &str = "✅ All channels selected.";
pub const ALL_UNSELECTED_TEXT: &str = "❌ All channels unselected.";

/// One channel line: its 1-based position and whether it is selected.
///
/// Raw channel ids are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    pub position: usize,
    pub selected: bool,
}

impl ChannelEntry {
    pub fn name(&self) -> String {
        format!("Channel {}", self.position)
    }

    /// Button label carrying the selection marker.
    pub fn label(&self) -> String {
        let marker = if self.selected { "✅" } else { "⬜" };
        format!("{marker} {}", self.name())
    }

    pub fn action(&self) -> Action {
        Action::Toggle(self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSummary {
    NoneSelected,
    /// Positions of the selected channels, ascending.
    Selected(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionView {
    pub entries: Vec<ChannelEntry>,
    pub summary: SelectionSummary,
}

impl SelectionView {
    /// Action affordances laid out in rows: one toggle per channel, then
    /// select-all/unselect-all, then dispatch.
    pub fn action_rows(&self) -> Vec<Vec<(String, Action)>> {
        let mut rows: Vec<Vec<(String, Action)>> = self
            .entries
            .iter()
            .map(|entry| vec![(entry.label(), entry.action())])
            .collect();
        rows.push(vec![
            (Action::SelectAll.label().to_string(), Action::SelectAll),
            (Action::UnselectAll.label().to_string(), Action::UnselectAll),
        ]);
        rows.push(vec![(
            Action::DispatchNow.label().to_string(),
            Action::DispatchNow,
        )]);
        rows
    }

    pub fn status_text(&self) -> String {
        let body = match &self.summary {
            SelectionSummary::NoneSelected => "None".to_string(),
            SelectionSummary::Selected(positions) => positions
                .iter()
                .map(|p| format!("✅ Channel {p}"))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        format!("🔘 Selected channels:\n{body}")
    }
}

pub fn render<M>(snapshot: &Snapshot<M>, channels: &ChannelList) -> SelectionView {
    let entries: Vec<ChannelEntry> = channels
        .iter()
        .enumerate()
        .map(|(i, id)| ChannelEntry {
            position: i + 1,
            selected: snapshot.is_selected(id),
        })
        .collect();
    let selected: Vec<usize> = entries
        .iter()
        .filter(|e| e.selected)
        .map(|e| e.position)
        .collect();
    let summary = if selected.is_empty() {
        SelectionSummary::NoneSelected
    } else {
        SelectionSummary::Selected(selected)
    };
    SelectionView { entries, summary }
}
