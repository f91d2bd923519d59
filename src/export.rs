//! CSV export of solver outputs

use std::io::Write;

use serde::Serialize;

use crate::{
    Result,
    gridworld::{Action, Environment},
    q_learning::QTable,
    types::{Policy, ValueFunction},
};

#[derive(Debug, Serialize)]
struct ValueRow {
    state: usize,
    row: usize,
    col: usize,
    cell: char,
    value: f64,
    action: Option<Action>,
}

#[derive(Debug, Serialize)]
struct QValueRow {
    state: usize,
    row: usize,
    col: usize,
    action: Action,
    q: f64,
    visits: u64,
}

/// One row per state: `state,row,col,cell,value,action`
pub fn write_values_csv<W: Write>(
    writer: W,
    env: &Environment,
    values: &ValueFunction,
    policy: &Policy,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for state in env.states() {
        let position = env.position_of(state);
        csv.serialize(ValueRow {
            state: state.index(),
            row: position.row,
            col: position.col,
            cell: env.cell(state).to_char(),
            value: values.get(state),
            action: policy.get(state),
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// One row per occupiable state and action: `state,row,col,action,q,visits`
pub fn write_q_table_csv<W: Write>(writer: W, env: &Environment, q_table: &QTable) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for state in env.occupiable_states() {
        let position = env.position_of(state);
        for action in Action::ALL {
            csv.serialize(QValueRow {
                state: state.index(),
                row: position.row,
                col: position.col,
                action,
                q: q_table.get(state, action),
                visits: q_table.visits(state, action),
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}
