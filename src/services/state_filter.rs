use serde::{Deserialize, Serialize};

pub const STATES_PER_ROW: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOption {
    pub state: String,
    pub selected: bool,
}

/// Deduplicated, alphabetically sorted states split into display rows.
pub fn state_rows<I, S>(states: I, selected: Option<&str>) -> Vec<Vec<StateOption>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut states: Vec<String> = states.into_iter().map(Into::into).collect();
    states.sort();
    states.dedup();

    states
        .chunks(STATES_PER_ROW)
        .map(|row| {
            row.iter()
                .map(|state| StateOption {
                    selected: selected == Some(state.as_str()),
                    state: state.clone(),
                })
                .collect()
        })
        .collect()
}
