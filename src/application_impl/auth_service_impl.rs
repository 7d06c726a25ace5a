use crate::application_port::{
    AccessToken, AuthError, AuthService, AuthTokens, CredentialHasher, LoginInput, LoginResult,
    RefreshToken, SignupInput, TokenCodec, TokenVerifyResult,
};
use crate::domain_model::UserId;
use crate::domain_port::{AuthRepo, SessionSlotStore, TxManager, UserRepo};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let argon2 = argon2::Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash).map_err(|e| {
            AuthError::InternalError(format!("invalid PHC hash: {}", e.to_string()))
        })?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!(
                "verify error: {}",
                e.to_string()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

const ACCESS_TYP: &str = "access";
const REFRESH_TYP: &str = "refresh";

// Access and refresh claims share a shape but carry a `typ` discriminator so
// one kind can never be presented as the other.
#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String, // recorded in the session slot; the token itself is not stored
    typ: String,
}

fn encode_access(
    uid: UserId,
    jti: String,
    cfg: &JwtConfig,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + cfg.access_ttl;
    let claims = AccessClaims {
        sub: uid.to_string(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
        jti,
        typ: ACCESS_TYP.to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn encode_refresh(
    uid: UserId,
    jti: String,
    cfg: &JwtConfig,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + cfg.refresh_ttl;
    let claims = RefreshClaims {
        sub: uid.to_string(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
        jti,
        typ: REFRESH_TYP.to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn validation(cfg: &JwtConfig) -> Validation {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    // Strict expiry: `now >= exp` must fail, so no leeway.
    v.leeway = 0;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    v
}

fn decode_access(token: &str, cfg: &JwtConfig) -> Result<AccessClaims, AuthError> {
    let v = validation(cfg);
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    if data.claims.typ != ACCESS_TYP {
        return Err(AuthError::TokenInvalid);
    }
    Ok(data.claims)
}

fn decode_refresh(token: &str, cfg: &JwtConfig) -> Result<RefreshClaims, AuthError> {
    let v = validation(cfg);
    let data = decode::<RefreshClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    if data.claims.typ != REFRESH_TYP {
        return Err(AuthError::TokenInvalid);
    }
    Ok(data.claims)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    #[inline]
    fn gen_jti() -> String {
        Uuid::new_v4().to_string()
    }

    #[inline]
    fn parse_user_id(sub: &str) -> Result<UserId, AuthError> {
        let id = sub.parse::<UserId>().map_err(|_| AuthError::TokenInvalid)?;
        Ok(id)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
        jti: Option<String>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let jti = jti.unwrap_or_else(Self::gen_jti);
        let (token, exp_dt) = encode_access(user, jti, &self.cfg)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        user: UserId,
        jti: String,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_refresh(user, jti, &self.cfg)?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let claims = decode_access(&token.0, &self.cfg)?;
        let user_id = Self::parse_user_id(&claims.sub)?;
        Ok(TokenVerifyResult {
            user_id,
            jti: claims.jti,
        })
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let claims = decode_refresh(&token.0, &self.cfg)?;
        let user_id = Self::parse_user_id(&claims.sub)?;
        Ok(TokenVerifyResult {
            user_id,
            jti: claims.jti,
        })
    }
}

pub struct RealAuthService {
    auth_repo: Arc<dyn AuthRepo>,
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn SessionSlotStore>,
    tx_manager: Arc<dyn TxManager>,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        auth_repo: Arc<dyn AuthRepo>,
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn SessionSlotStore>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            auth_repo,
            user_repo,
            credential_hasher,
            token_codec,
            session_store,
            tx_manager,
            min_password_len: 8,
        }
    }

    fn validate_signup(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidInput("malformed email".to_string()));
        }
        if password.len() < self.min_password_len {
            return Err(AuthError::InvalidInput("password too short".to_string()));
        }
        Ok(())
    }

    #[inline]
    fn new_user_id() -> UserId {
        UserId(Uuid::new_v4())
    }

    #[inline]
    fn new_jti() -> String {
        Uuid::new_v4().to_string()
    }

    fn ttl_secs(until: DateTime<Utc>) -> u64 {
        let now = Utc::now();
        let secs = (until - now).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        let SignupInput { email, password } = request;

        self.validate_signup(&email, &password)?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_id = Self::new_user_id();

        self.user_repo
            .create_in_tx(tx.as_mut(), user_id, &email)
            .await?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        self.auth_repo
            .create_credentials_in_tx(tx.as_mut(), user_id, &email, &password_hash)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(user_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let rec = self
            .auth_repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !rec.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        // Access and refresh get independent jtis; only the refresh jti is
        // recorded server-side.
        let refresh_jti = Self::new_jti();

        let (access_token, access_exp) =
            self.token_codec.issue_access_token(rec.user_id, None).await?;

        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue_refresh_token(rec.user_id, refresh_jti.clone())
            .await?;

        // Last write wins: any refresh token issued under a previous slot
        // value is dead from here on.
        let ttl_secs = Self::ttl_secs(refresh_exp);
        self.session_store
            .put_slot(rec.user_id, &refresh_jti, ttl_secs)
            .await?;

        Ok(LoginResult {
            user_id: rec.user_id,
            tokens: AuthTokens {
                access_token,
                refresh_token,
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh_exp,
            },
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let verify_result = self
            .token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await?;

        if !self.user_repo.id_exists(verify_result.user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        Ok(verify_result.user_id)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let verify_result = self
            .token_codec
            .verify_refresh_token(&RefreshToken(refresh_token.to_string()))
            .await?;

        if !self.user_repo.id_exists(verify_result.user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        let user_id = verify_result.user_id;
        let presented_jti = verify_result.jti;

        let new_jti = Self::new_jti();

        let (access_token, access_exp) =
            self.token_codec.issue_access_token(user_id, None).await?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue_refresh_token(user_id, new_jti.clone())
            .await?;

        // Rotation is a single compare-and-swap on the slot. Two racing
        // refresh calls both decode the same old token; exactly one swap
        // lands, the loser sees a mismatch. Nothing is mutated on failure.
        let ttl_secs = Self::ttl_secs(refresh_exp);
        let rotated = self
            .session_store
            .replace_slot(user_id, &presented_jti, &new_jti, ttl_secs)
            .await?;
        if !rotated {
            return Err(AuthError::TokenRevoked);
        }

        Ok(AuthTokens {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    async fn logout(&self, refresh_token: Option<&str>) -> Result<(), AuthError> {
        // Idempotent by contract: a missing, malformed, expired, or foreign
        // token still logs out successfully.
        let Some(token) = refresh_token else {
            return Ok(());
        };

        let verify_result = match self
            .token_codec
            .verify_refresh_token(&RefreshToken(token.to_string()))
            .await
        {
            Ok(v) => v,
            Err(_) => return Ok(()),
        };

        match self.user_repo.id_exists(verify_result.user_id).await {
            Ok(true) => {
                if let Err(e) = self.session_store.clear_slot(verify_result.user_id).await {
                    warn!("logout: clearing session slot failed: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => warn!("logout: user lookup failed: {}", e),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::{
        MemoryAuthRepo, MemorySessionSlotStore, MemoryTxManager, MemoryUserRepo,
    };

    fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            issuer: "gatehouse.test".to_string(),
            audience: "test-client".to_string(),
            access_ttl: Duration::from_secs(600),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            signing_key: b"test-signing-key-0123456789abcdef".to_vec(),
        }
    }

    struct Fixture {
        service: RealAuthService,
        codec: Arc<dyn TokenCodec>,
        slots: Arc<MemorySessionSlotStore>,
    }

    fn fixture() -> Fixture {
        let codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(test_jwt_config()));
        let slots = Arc::new(MemorySessionSlotStore::new());
        let service = RealAuthService::new(
            Arc::new(MemoryAuthRepo::new()),
            Arc::new(MemoryUserRepo::new()),
            Arc::new(Argon2PasswordHasher),
            codec.clone(),
            slots.clone(),
            Arc::new(MemoryTxManager),
        );
        Fixture {
            service,
            codec,
            slots,
        }
    }

    async fn signup_and_login(fx: &Fixture) -> LoginResult {
        fx.service
            .signup(SignupInput {
                email: "a@x.com".to_string(),
                password: "password1".to_string(),
            })
            .await
            .unwrap();
        fx.service
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "password1".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn hasher_roundtrip() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash_password("password1").await.unwrap();
        assert!(hasher.verify_password("password1", &hash).await.unwrap());
        assert!(!hasher.verify_password("password2", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn codec_roundtrip() {
        let codec = JwtHs256Codec::new(test_jwt_config());
        let user = UserId(Uuid::new_v4());

        let (access, _) = codec.issue_access_token(user, None).await.unwrap();
        let verified = codec.verify_access_token(&access).await.unwrap();
        assert_eq!(verified.user_id, user);

        let (refresh, _) = codec
            .issue_refresh_token(user, "some-jti".to_string())
            .await
            .unwrap();
        let verified = codec.verify_refresh_token(&refresh).await.unwrap();
        assert_eq!(verified.user_id, user);
        assert_eq!(verified.jti, "some-jti");
    }

    #[tokio::test]
    async fn codec_rejects_foreign_signature() {
        let codec = JwtHs256Codec::new(test_jwt_config());
        let mut other_cfg = test_jwt_config();
        other_cfg.signing_key = b"a-completely-different-signing-key".to_vec();
        let other = JwtHs256Codec::new(other_cfg);

        let user = UserId(Uuid::new_v4());
        let (access, _) = other.issue_access_token(user, None).await.unwrap();

        let err = codec.verify_access_token(&access).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn codec_rejects_kind_confusion() {
        let codec = JwtHs256Codec::new(test_jwt_config());
        let user = UserId(Uuid::new_v4());

        let (access, _) = codec.issue_access_token(user, None).await.unwrap();
        let err = codec
            .verify_refresh_token(&RefreshToken(access.0.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));

        let (refresh, _) = codec
            .issue_refresh_token(user, "some-jti".to_string())
            .await
            .unwrap();
        let err = codec
            .verify_access_token(&AccessToken(refresh.0.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn codec_rejects_expired_token() {
        let cfg = test_jwt_config();
        let codec = JwtHs256Codec::new(test_jwt_config());
        let now = Utc::now();
        let claims = AccessClaims {
            sub: UserId(Uuid::new_v4()).to_string(),
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            iat: (now - chrono::Duration::hours(2)).timestamp(),
            iss: cfg.issuer.clone(),
            aud: cfg.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            typ: ACCESS_TYP.to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&cfg.signing_key),
        )
        .unwrap();

        let err = codec
            .verify_access_token(&AccessToken(token))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let fx = fixture();
        let input = SignupInput {
            email: "a@x.com".to_string(),
            password: "password1".to_string(),
        };
        fx.service.signup(input.clone()).await.unwrap();
        let err = fx.service.signup(input).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let fx = fixture();
        fx.service
            .signup(SignupInput {
                email: "a@x.com".to_string(),
                password: "password1".to_string(),
            })
            .await
            .unwrap();

        let err = fx
            .service
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = fx
            .service
            .login(LoginInput {
                email: "nobody@x.com".to_string(),
                password: "password1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_binds_refresh_jti_to_slot() {
        let fx = fixture();
        let result = signup_and_login(&fx).await;

        let decoded = fx
            .codec
            .verify_refresh_token(&result.tokens.refresh_token)
            .await
            .unwrap();
        let slot = fx.slots.get_slot(result.user_id).await.unwrap();
        assert_eq!(slot.as_deref(), Some(decoded.jti.as_str()));

        // The access token carries its own jti, never the slot's.
        let access = fx
            .codec
            .verify_access_token(&result.tokens.access_token)
            .await
            .unwrap();
        assert_ne!(access.jti, decoded.jti);
    }

    #[tokio::test]
    async fn refresh_rotates_the_slot() {
        let fx = fixture();
        let result = signup_and_login(&fx).await;
        let old_jti = fx
            .codec
            .verify_refresh_token(&result.tokens.refresh_token)
            .await
            .unwrap()
            .jti;

        let rotated = fx
            .service
            .refresh_token(&result.tokens.refresh_token.0)
            .await
            .unwrap();

        let new_jti = fx
            .codec
            .verify_refresh_token(&rotated.refresh_token)
            .await
            .unwrap()
            .jti;
        assert_ne!(new_jti, old_jti);

        let slot = fx.slots.get_slot(result.user_id).await.unwrap();
        assert_eq!(slot.as_deref(), Some(new_jti.as_str()));
    }

    #[tokio::test]
    async fn superseded_refresh_token_is_rejected() {
        let fx = fixture();
        let result = signup_and_login(&fx).await;

        fx.service
            .refresh_token(&result.tokens.refresh_token.0)
            .await
            .unwrap();

        let err = fx
            .service
            .refresh_token(&result.tokens.refresh_token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenRevoked));
    }

    #[tokio::test]
    async fn second_login_invalidates_previous_refresh_token() {
        let fx = fixture();
        let first = signup_and_login(&fx).await;
        fx.service
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "password1".to_string(),
            })
            .await
            .unwrap();

        let err = fx
            .service
            .refresh_token(&first.tokens.refresh_token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenRevoked));
    }

    #[tokio::test]
    async fn concurrent_refresh_admits_one_winner() {
        let fx = fixture();
        let result = signup_and_login(&fx).await;
        let token = result.tokens.refresh_token.0;

        let (a, b) = tokio::join!(
            fx.service.refresh_token(&token),
            fx.service.refresh_token(&token)
        );
        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser.unwrap_err(), AuthError::TokenRevoked));
    }

    #[tokio::test]
    async fn expired_refresh_token_is_rejected_without_mutation() {
        let fx = fixture();
        let result = signup_and_login(&fx).await;
        let slot_before = fx.slots.get_slot(result.user_id).await.unwrap();

        let cfg = test_jwt_config();
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: result.user_id.to_string(),
            exp: (now - chrono::Duration::minutes(5)).timestamp(),
            iat: (now - chrono::Duration::hours(1)).timestamp(),
            iss: cfg.issuer.clone(),
            aud: cfg.audience.clone(),
            jti: slot_before.clone().unwrap(),
            typ: REFRESH_TYP.to_string(),
        };
        let stale = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&cfg.signing_key),
        )
        .unwrap();

        let err = fx.service.refresh_token(&stale).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(fx.slots.get_slot(result.user_id).await.unwrap(), slot_before);
    }

    #[tokio::test]
    async fn logout_clears_slot_and_is_idempotent() {
        let fx = fixture();
        let result = signup_and_login(&fx).await;

        fx.service
            .logout(Some(&result.tokens.refresh_token.0))
            .await
            .unwrap();
        assert_eq!(fx.slots.get_slot(result.user_id).await.unwrap(), None);

        let err = fx
            .service
            .refresh_token(&result.tokens.refresh_token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenRevoked));

        // Every degenerate input still succeeds.
        fx.service.logout(None).await.unwrap();
        fx.service.logout(Some("not-a-jwt")).await.unwrap();
        fx.service
            .logout(Some(&result.tokens.refresh_token.0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn verify_token_checks_kind_and_subject() {
        let fx = fixture();
        let result = signup_and_login(&fx).await;

        let user_id = fx
            .service
            .verify_token(&result.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(user_id, result.user_id);

        // A refresh token is not an access token.
        let err = fx
            .service
            .verify_token(&result.tokens.refresh_token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));

        // Well-signed token for a subject that never existed.
        let ghost = UserId(Uuid::new_v4());
        let (token, _) = fx.codec.issue_access_token(ghost, None).await.unwrap();
        let err = fx.service.verify_token(&token.0).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
