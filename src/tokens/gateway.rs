//! Single-use, time-boxed approval tokens.
//!
//! ## Invariants
//! - Only the SHA-256 hash of a token is stored
//! - Issuing for a request supersedes every active token of that request
//! - A token moves `active -> claimed -> used` at most once; a failed
//!   transition releases the claim back to `active`

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::TokenSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ApprovalToken, EmployeeId, IssuedToken, RequestId, TokenAction, TokenGrant, TokenId,
    TokenStatus,
};

use super::crypto::{generate_token, hash_token};

#[derive(Debug, Default)]
struct TokenTable {
    tokens: HashMap<TokenId, ApprovalToken>,
    by_hash: HashMap<String, TokenId>,
}

impl TokenTable {
    fn by_raw(&mut self, raw: &str) -> Option<&mut ApprovalToken> {
        let id = self.by_hash.get(&hash_token(raw))?;
        self.tokens.get_mut(id)
    }

    fn remove(&mut self, id: TokenId) {
        if let Some(token) = self.tokens.remove(&id) {
            self.by_hash.remove(&token.token_hash);
        }
    }
}

/// Issues and redeems approval tokens.
#[derive(Debug)]
pub struct TokenGateway {
    ttl: Duration,
    entropy_bytes: usize,
    table: Mutex<TokenTable>,
}

impl Default for TokenGateway {
    fn default() -> Self {
        Self::new(&TokenSettings::default())
    }
}

impl TokenGateway {
    /// Creates an empty gateway.
    pub fn new(settings: &TokenSettings) -> Self {
        Self {
            ttl: settings.ttl(),
            entropy_bytes: settings.entropy_bytes,
            table: Mutex::new(TokenTable::default()),
        }
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn table(&self) -> EngineResult<MutexGuard<'_, TokenTable>> {
        self.table.lock().map_err(|_| EngineError::poisoned())
    }

    /// Issues one token, superseding the request's earlier active tokens.
    pub fn issue(
        &self,
        request_id: RequestId,
        approver_id: EmployeeId,
        action: TokenAction,
    ) -> EngineResult<IssuedToken> {
        let mut issued = self.issue_batch(request_id, &[(approver_id, action)])?;
        issued
            .pop()
            .ok_or_else(|| EngineError::validation("grants", "nothing to issue"))
    }

    /// Issues one token per `(approver, action)` pair. Earlier active tokens of
    /// the request are superseded first, so the batch is the only redeemable
    /// set afterwards.
    pub fn issue_batch(
        &self,
        request_id: RequestId,
        grants: &[(EmployeeId, TokenAction)],
    ) -> EngineResult<Vec<IssuedToken>> {
        self.issue_batch_at(request_id, grants, Utc::now())
    }

    /// [`issue_batch`](Self::issue_batch) with an explicit clock.
    pub fn issue_batch_at(
        &self,
        request_id: RequestId,
        grants: &[(EmployeeId, TokenAction)],
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<IssuedToken>> {
        let mut table = self.table()?;
        let superseded = Self::set_status_where(&mut table, request_id, TokenStatus::Superseded);

        let expires_at = now + self.ttl;
        let mut issued = Vec::with_capacity(grants.len());
        for &(approver_id, action) in grants {
            let raw = generate_token(self.entropy_bytes);
            let token = ApprovalToken {
                id: TokenId::new(),
                request_id,
                approver_id,
                action,
                token_hash: hash_token(&raw),
                issued_at: now,
                expires_at,
                status: TokenStatus::Active,
            };
            table.by_hash.insert(token.token_hash.clone(), token.id);
            issued.push(IssuedToken {
                id: token.id,
                token: raw,
                approver_id,
                action,
                expires_at,
            });
            table.tokens.insert(token.id, token);
        }
        info!(
            request_id = %request_id,
            issued = issued.len(),
            superseded,
            "Approval tokens issued"
        );
        Ok(issued)
    }

    /// Looks up an active, unexpired token without consuming it.
    pub fn redeem(&self, raw: &str) -> EngineResult<TokenGrant> {
        self.redeem_at(raw, Utc::now())
    }

    /// [`redeem`](Self::redeem) with an explicit clock.
    pub fn redeem_at(&self, raw: &str, now: DateTime<Utc>) -> EngineResult<TokenGrant> {
        let mut table = self.table()?;
        match table.by_raw(raw) {
            Some(token) if token.is_redeemable(now) => Ok(grant_of(token)),
            _ => Err(EngineError::InvalidOrExpiredToken),
        }
    }

    /// Atomically moves an active, unexpired token to `claimed`. While
    /// claimed the token cannot be redeemed or claimed again.
    pub fn claim(&self, raw: &str) -> EngineResult<TokenGrant> {
        self.claim_at(raw, Utc::now())
    }

    /// [`claim`](Self::claim) with an explicit clock.
    pub fn claim_at(&self, raw: &str, now: DateTime<Utc>) -> EngineResult<TokenGrant> {
        let mut table = self.table()?;
        let token = table
            .by_raw(raw)
            .filter(|t| t.is_redeemable(now))
            .ok_or(EngineError::InvalidOrExpiredToken)?;
        token.status = TokenStatus::Claimed;
        debug!(token_id = %token.id, request_id = %token.request_id, "Approval token claimed");
        Ok(grant_of(token))
    }

    /// Marks a claimed token used.
    pub fn consume(&self, token_id: TokenId) -> EngineResult<()> {
        self.finish_claim(token_id, TokenStatus::Used)
    }

    /// Returns a claimed token to `active` so it can be redeemed again.
    pub fn release(&self, token_id: TokenId) -> EngineResult<()> {
        self.finish_claim(token_id, TokenStatus::Active)
    }

    fn finish_claim(&self, token_id: TokenId, status: TokenStatus) -> EngineResult<()> {
        let mut table = self.table()?;
        let token = table
            .tokens
            .get_mut(&token_id)
            .filter(|t| t.status == TokenStatus::Claimed)
            .ok_or(EngineError::InvalidOrExpiredToken)?;
        token.status = status;
        debug!(token_id = %token_id, status = ?status, "Approval token claim finished");
        Ok(())
    }

    /// Revokes every active token of a request. Claimed tokens are left to
    /// their claimant. Returns how many were revoked.
    pub fn revoke_for_request(&self, request_id: RequestId) -> EngineResult<usize> {
        let mut table = self.table()?;
        let revoked = Self::set_status_where(&mut table, request_id, TokenStatus::Revoked);
        if revoked > 0 {
            info!(request_id = %request_id, revoked, "Approval tokens revoked");
        }
        Ok(revoked)
    }

    /// Drops every token that expired at or before `now`, unless it is
    /// currently claimed. Returns how many were dropped.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> EngineResult<usize> {
        let mut table = self.table()?;
        let expired: Vec<TokenId> = table
            .tokens
            .values()
            .filter(|t| t.expires_at <= now && t.status != TokenStatus::Claimed)
            .map(|t| t.id)
            .collect();
        for id in &expired {
            table.remove(*id);
        }
        debug!(purged = expired.len(), "Expired approval tokens purged");
        Ok(expired.len())
    }

    /// Every stored token of a request, oldest first.
    pub fn tokens_for(&self, request_id: RequestId) -> EngineResult<Vec<ApprovalToken>> {
        let table = self.table()?;
        let mut tokens: Vec<ApprovalToken> = table
            .tokens
            .values()
            .filter(|t| t.request_id == request_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.issued_at);
        Ok(tokens)
    }

    fn set_status_where(table: &mut TokenTable, request_id: RequestId, status: TokenStatus) -> usize {
        let mut changed = 0;
        for token in table.tokens.values_mut() {
            if token.request_id == request_id && token.status == TokenStatus::Active {
                token.status = status;
                changed += 1;
            }
        }
        changed
    }
}

fn grant_of(token: &ApprovalToken) -> TokenGrant {
    TokenGrant {
        token_id: token.id,
        request_id: token.request_id,
        approver_id: token.approver_id,
        action: token.action,
    }
}
