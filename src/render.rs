//! Plain-text rendering of grids, value tables, policies and Q-tables
//!
//! Pure functions returning `String`s; printing and file output are left to
//! the caller.

use crate::{
    gridworld::{Action, Cell, Environment, State},
    q_learning::QTable,
    types::{Policy, ValueFunction},
};

/// Width of one Q-table cell block (`↑: 0.00  ↓: 0.00 `)
const Q_BLOCK_WIDTH: usize = 17;

fn rows<'a>(env: &'a Environment) -> impl Iterator<Item = Vec<State>> + 'a {
    (0..env.rows()).map(move |row| {
        (0..env.cols())
            .map(|col| State::new(row * env.cols() + col))
            .collect()
    })
}

/// The grid with the agent marked `P`
pub fn grid(env: &Environment, agent: Option<State>) -> String {
    let mut out = String::new();
    for row in rows(env) {
        let line: Vec<String> = row
            .iter()
            .map(|&s| {
                if Some(s) == agent {
                    "P".to_string()
                } else {
                    env.cell(s).to_char().to_string()
                }
            })
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Value table, one centred `{:^6.2}` entry per cell
pub fn values(env: &Environment, values: &ValueFunction) -> String {
    let mut out = String::new();
    for row in rows(env) {
        let line: Vec<String> = row
            .iter()
            .map(|&s| format!("{:^6.2}", values.get(s)))
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

fn policy_glyph(env: &Environment, state: State, action: Option<Action>) -> char {
    match (env.cell(state), action) {
        (Cell::Wall, _) => '#',
        (_, Some(action)) => action.arrow(),
        (cell, None) if cell.is_terminal() => cell.to_char(),
        (_, None) => '?',
    }
}

/// Policy as arrows; `?` marks states with no decision yet
pub fn policy(env: &Environment, policy: &Policy) -> String {
    let mut out = String::new();
    for row in rows(env) {
        let line: String = row
            .iter()
            .map(|&s| policy_glyph(env, s, policy.get(s)).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Q-table laid out on the grid: up/down on the first text line of each
/// row, left/right on the second.
pub fn q_values(env: &Environment, q_table: &QTable) -> String {
    let mut out = String::new();
    let pairs = [[Action::Up, Action::Down], [Action::Left, Action::Right]];

    for (row_index, row) in rows(env).enumerate() {
        for pair in &pairs {
            let blocks: Vec<String> = row
                .iter()
                .map(|&s| {
                    if env.is_wall(s) {
                        "#".repeat(Q_BLOCK_WIDTH)
                    } else {
                        let entries: Vec<String> = pair
                            .iter()
                            .map(|&action| {
                                format!("{}:{:^6.2}", action.arrow(), q_table.get(s, action))
                            })
                            .collect();
                        entries.join(" ").trim_end().to_string()
                    }
                })
                .collect();
            out.push_str(&blocks.join(" | "));
            out.push('\n');
        }
        if row_index + 1 < env.rows() {
            out.push_str(&"-".repeat((Q_BLOCK_WIDTH + 2) * env.cols()));
            out.push('\n');
        }
    }
    out
}
