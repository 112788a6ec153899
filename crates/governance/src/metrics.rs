//! The `get_metrics` and `get_history` operations (spec §6): read-only
//! views over an agent's live state and durable history. Neither mutates
//! anything, so neither takes the agent lock.

use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::{CallerContext, GetHistoryArgs, GetMetricsArgs, HistoryFormat};

use crate::context::ServiceContext;
use crate::identity_resolve::resolve_existing_agent;
use crate::response::{HistoryResponse, HistoryRow, MetricsResponse, StateSnapshot};

pub fn get_metrics(ctx: &ServiceContext, caller: &CallerContext, args: GetMetricsArgs) -> Result<MetricsResponse> {
    let resolved = resolve_existing_agent(ctx, caller, args.agent_id.as_deref(), None)?;

    Ok(MetricsResponse {
        uuid: resolved.uuid,
        agent_id: resolved.metadata.agent_id,
        status: resolved.metadata.status,
        state: StateSnapshot {
            e: resolved.state.dynamics.e,
            i: resolved.state.dynamics.i,
            s: resolved.state.dynamics.s,
            v: resolved.state.dynamics.v,
        },
        coherence: resolved.state.coherence,
        risk: resolved.state.risk,
        lambda1: resolved.state.governor.lambda1,
        void_active: resolved.state.void_active,
        recent_history: resolved
            .state
            .history
            .recent(20)
            .into_iter()
            .map(|entry| HistoryRow {
                recorded_at: entry.timestamp,
                e: entry.e,
                i: entry.i,
                s: entry.s,
                v: entry.v,
                coherence: entry.coherence,
                risk: entry.risk,
                verdict: entry.verdict,
            })
            .collect(),
    })
}

/// `format=summary` returns the in-memory hot ring (cheap, bounded by the
/// ring's own capacity); `format=full` goes to the durable store for a
/// slice that can reach further back than the ring keeps (spec §4.6: the
/// ring only holds the hot tail, the SQLite `agent_state` table holds the
/// full record).
pub fn get_history(ctx: &ServiceContext, caller: &CallerContext, args: GetHistoryArgs) -> Result<HistoryResponse> {
    let resolved = resolve_existing_agent(ctx, caller, args.agent_id.as_deref(), None)?;

    let rows = match args.format {
        HistoryFormat::Summary => resolved
            .state
            .history
            .recent(args.limit)
            .into_iter()
            .map(|entry| HistoryRow {
                recorded_at: entry.timestamp,
                e: entry.e,
                i: entry.i,
                s: entry.s,
                v: entry.v,
                coherence: entry.coherence,
                risk: entry.risk,
                verdict: entry.verdict,
            })
            .collect(),
        HistoryFormat::Full => ctx
            .store
            .history_slice(resolved.uuid, args.limit)?
            .into_iter()
            .map(|row| {
                Ok(HistoryRow {
                    recorded_at: row.recorded_at,
                    e: row.e,
                    i: row.i,
                    s: row.s,
                    v: row.v,
                    coherence: row.coherence,
                    risk: row.risk,
                    verdict: row
                        .verdict
                        .parse()
                        .map_err(|_| Error::Storage(format!("corrupt verdict in history row: {}", row.verdict)))?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(HistoryResponse { uuid: resolved.uuid, rows })
}
