use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

const SESSION_KEY_PREFIX: &str = "session";

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let key = std::env::var("JWT_SIGNING_KEY")
            .unwrap_or_else(|_| "gatehouse-dev-secret".to_string())
            .into_bytes();
        let jwt_config = JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_mins * 60),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_days * 24 * 60 * 60),
            signing_key: key,
        };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(jwt_config));

        let server = match settings.auth.backend.as_str() {
            "memory" => {
                let user_repo: Arc<dyn UserRepo> = Arc::new(MemoryUserRepo::new());
                Self::assemble(
                    Arc::new(MemoryAuthRepo::new()),
                    user_repo,
                    credential_hasher,
                    token_codec,
                    Arc::new(MemorySessionSlotStore::new()),
                    Arc::new(MemoryTxManager),
                    None,
                )
            }
            "real" => {
                let redis_client = redis::Client::open(settings.redis.dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let session_store: Arc<dyn SessionSlotStore> = Arc::new(
                    RedisSessionSlotStore::new(redis_manager, SESSION_KEY_PREFIX),
                );

                let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;
                let tx_manager: Arc<dyn TxManager> = Arc::new(MySqlTxManager::new(pool.clone()));
                let auth_repo: Arc<dyn AuthRepo> = Arc::new(MySqlAuthRepo::new(pool.clone()));
                let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool.clone()));

                Self::assemble(
                    auth_repo,
                    user_repo,
                    credential_hasher,
                    token_codec,
                    session_store,
                    tx_manager,
                    Some(pool),
                )
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        info!("server started");

        Ok(server)
    }

    fn assemble(
        auth_repo: Arc<dyn AuthRepo>,
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn SessionSlotStore>,
        tx_manager: Arc<dyn TxManager>,
        pool: Option<Pool<MySql>>,
    ) -> Self {
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            auth_repo,
            user_repo.clone(),
            credential_hasher,
            token_codec,
            session_store,
            tx_manager,
        ));
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(user_repo));

        Self {
            auth_service,
            user_service,
            pool,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
