//! `sendVerificationCode`/`verifyCode` (spec §6, §4.10): rate-limited code
//! issuance over one of two channels, bcrypt-verified, locked out after
//! `VERIFICATION_MAX_ATTEMPTS`, with the fully-verified transition
//! publishing `IdentityVerified` through the same transactional outbox
//! the Money Engine uses for domain events.

use std::sync::Arc;

use money_core::clock::Clock;
use money_core::constants::{VERIFICATION_CODE_TTL_SECS, VERIFICATION_MAX_ATTEMPTS};
use money_core::identity::{VerificationAttempt, VerificationChannel};
use money_core::ids::{UserId, VerificationId};
use money_core::outbox::DomainEventType;
use money_core::MoneyError;
use money_outbox::{EmailOutboxStore, OutboxStore, SmsOutboxStore};

use crate::attempts::VerificationStore;
use crate::code::{generate_code, hash_code, verify_code};
use crate::record::{IdentityRecord, IdentityStore};

pub struct IdentityVerificationService {
    identity: IdentityStore,
    attempts: VerificationStore,
    email: EmailOutboxStore,
    sms: SmsOutboxStore,
    outbox: OutboxStore,
    clock: Arc<dyn Clock>,
}

impl IdentityVerificationService {
    pub fn new(
        identity: IdentityStore,
        attempts: VerificationStore,
        email: EmailOutboxStore,
        sms: SmsOutboxStore,
        outbox: OutboxStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            attempts,
            email,
            sms,
            outbox,
            clock,
        }
    }

    /// Generates and queues a code for `channel`. Per-channel rate limit
    /// (spec §4.10, §5 "rate limiters throttle send endpoints"): a channel
    /// with an outstanding, unexpired, unverified attempt rejects a new
    /// send rather than issuing a second live code (Open Question
    /// decision, see DESIGN.md).
    pub fn send_code(
        &self,
        user_id: UserId,
        channel: VerificationChannel,
        target: &str,
    ) -> Result<VerificationId, MoneyError> {
        let now = self.clock.now_unix();

        if let Some(existing) = self.attempts.latest_for(user_id, channel)? {
            if !existing.success && !existing.is_expired(now) {
                return Err(MoneyError::RateLimited {
                    channel: channel_label(channel).to_string(),
                });
            }
        }

        let code = generate_code();
        let code_hash = hash_code(&code)?;
        let attempt = VerificationAttempt {
            id: VerificationId::new(),
            user_id,
            channel,
            target: target.to_string(),
            code_hash,
            expires_at: now + VERIFICATION_CODE_TTL_SECS,
            attempt_count: 0,
            success: false,
            created_at: now,
        };
        self.attempts.put(&attempt)?;

        let idem_key = format!("verify:{}:{}", attempt.id, channel_label(channel));
        match channel {
            VerificationChannel::Email => {
                self.email.enqueue(
                    target,
                    "Your verification code",
                    format!("Your code is {code}"),
                    idem_key,
                    now,
                )?;
            }
            VerificationChannel::Sms => {
                self.sms
                    .enqueue(target, format!("Your verification code is {code}"), idem_key, now)?;
            }
        }

        metrics::counter!("money_identity_codes_sent_total").increment(1);
        Ok(attempt.id)
    }

    /// Verifies `code` against the most recent attempt for `channel`. On
    /// success, stamps the identity record and — once both channels are
    /// verified — emits `IdentityVerified` exactly once.
    pub fn verify_code(
        &self,
        user_id: UserId,
        channel: VerificationChannel,
        code: &str,
    ) -> Result<IdentityRecord, MoneyError> {
        let now = self.clock.now_unix();
        let mut attempt = self
            .attempts
            .latest_for(user_id, channel)?
            .ok_or(MoneyError::VerificationCodeMismatch)?;

        if attempt.success {
            return self
                .identity
                .get(user_id)?
                .ok_or(MoneyError::VerificationCodeMismatch);
        }
        if attempt.is_expired(now) {
            return Err(MoneyError::VerificationCodeExpired);
        }
        if attempt.is_locked_out(VERIFICATION_MAX_ATTEMPTS) {
            return Err(MoneyError::VerificationLockedOut);
        }

        if !verify_code(code, &attempt.code_hash)? {
            attempt.attempt_count += 1;
            self.attempts.put(&attempt)?;
            return Err(MoneyError::VerificationCodeMismatch);
        }

        attempt.success = true;
        self.attempts.put(&attempt)?;

        let was_fully_verified = self
            .identity
            .get(user_id)?
            .is_some_and(|r| r.is_fully_verified());
        let record = self.identity.mark_channel_verified(user_id, channel, now)?;

        if !was_fully_verified && record.is_fully_verified() {
            self.outbox.enqueue(
                DomainEventType::IdentityVerified,
                "user",
                user_id.to_string(),
                1,
                format!("identity.verified:{user_id}"),
                serde_json::json!({ "user_id": user_id.to_string() }),
                "identity",
                now,
            )?;
            metrics::counter!("money_identity_fully_verified_total").increment(1);
        }

        Ok(record)
    }
}

fn channel_label(channel: VerificationChannel) -> &'static str {
    match channel {
        VerificationChannel::Email => "email",
        VerificationChannel::Sms => "sms",
    }
}
