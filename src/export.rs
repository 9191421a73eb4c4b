// Results export: the final tabular report consumed at completion.
//
// One row per team (roster, spend, remaining budget) followed by a single
// block row for unassigned players. Row building is pure so the report
// content is testable without touching disk.

use anyhow::{Context, Result};

use crate::auction::ledger::RosterLedger;
use crate::auction::player::{Player, Team};

/// One exported row. The unassigned block reuses the same shape with
/// placeholder captain/budget fields, mirroring the sheet the operators
/// already know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub team_name: String,
    pub captain: String,
    pub player_count: usize,
    pub players: String,
    pub roles: String,
    pub total_spend: u32,
    pub budget_remaining: Option<u32>,
    pub budget_spent: Option<u32>,
}

/// Build the full report: team rows in team order, then the unassigned
/// block (present only when unassigned players exist).
pub fn build_report(players: &[Player], teams: &[Team], ledger: &RosterLedger) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = teams
        .iter()
        .map(|team| {
            let roster: Vec<&Player> = players
                .iter()
                .filter(|p| {
                    ledger
                        .assignment(&p.id)
                        .is_some_and(|a| a.team_id == team.id)
                })
                .collect();
            let remaining = ledger.remaining(&team.id).unwrap_or(0);
            let cap = ledger.cap(&team.id).unwrap_or(0);
            ReportRow {
                team_name: team.name.clone(),
                captain: team.captain.clone(),
                player_count: roster.len(),
                players: join_names(&roster, |p| &p.name),
                roles: join_names(&roster, |p| &p.role),
                total_spend: ledger.total_price_paid(&team.id),
                budget_remaining: Some(remaining),
                budget_spent: Some(cap.saturating_sub(remaining)),
            }
        })
        .collect();

    let unassigned: Vec<&Player> = players
        .iter()
        .filter(|p| !ledger.is_assigned(&p.id))
        .collect();
    if !unassigned.is_empty() {
        rows.push(ReportRow {
            team_name: "Unassigned Players".to_string(),
            captain: "-".to_string(),
            player_count: unassigned.len(),
            players: join_names(&unassigned, |p| &p.name),
            roles: join_names(&unassigned, |p| &p.role),
            total_spend: unassigned.iter().map(|p| p.base_price).sum(),
            budget_remaining: None,
            budget_spent: None,
        });
    }

    rows
}

/// Write the report as CSV at `path`.
pub fn write_report(
    path: &str,
    players: &[Player],
    teams: &[Team],
    ledger: &RosterLedger,
) -> Result<()> {
    let rows = build_report(players, teams, ledger);
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create results file at {path}"))?;

    writer
        .write_record([
            "Team Name",
            "Captain",
            "Total Players",
            "Players",
            "Roles",
            "Total Spend",
            "Budget Remaining",
            "Budget Spent",
        ])
        .context("failed to write report header")?;

    for row in &rows {
        let record = vec![
            row.team_name.clone(),
            row.captain.clone(),
            row.player_count.to_string(),
            row.players.clone(),
            row.roles.clone(),
            row.total_spend.to_string(),
            row.budget_remaining.map(|v| v.to_string()).unwrap_or_default(),
            row.budget_spent.map(|v| v.to_string()).unwrap_or_default(),
        ];
        writer
            .write_record(&record)
            .context("failed to write report row")?;
    }

    writer.flush().context("failed to flush report")?;
    Ok(())
}

fn join_names<'a, F>(players: &[&'a Player], field: F) -> String
where
    F: Fn(&'a Player) -> &'a str,
{
    players.iter().map(|p| field(*p)).collect::<Vec<_>>().join(", ")
}
