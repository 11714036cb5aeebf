use crate::handlers::error::ApiError;
use crate::models::auth::Claims;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Fixed-window counter keyed by client (IP or user id).
#[derive(Clone)]
pub struct RateLimiter {
    // key -> (request_count, window_start)
    clients: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut clients = match self.clients.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();

        match clients.get_mut(key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) > self.window_duration {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count >= self.max_requests {
                    false
                } else {
                    *count += 1;
                    true
                }
            }
            None => {
                clients.insert(key.to_string(), (1, now));
                true
            }
        }
    }

    pub fn cleanup_expired(&self) {
        let mut clients = match self.clients.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();

        clients.retain(|_, (_, window_start)| now.duration_since(*window_start) <= self.window_duration);
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }
}

fn too_many(message: &str) -> ApiError {
    ApiError::new(StatusCode::TOO_MANY_REQUESTS, message)
}

/// Login throttling: 10 attempts per minute per IP.
pub async fn strict_rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    static STRICT_RATE_LIMITER: std::sync::OnceLock<RateLimiter> = std::sync::OnceLock::new();
    let rate_limiter = STRICT_RATE_LIMITER.get_or_init(|| RateLimiter::new(10, 60));

    let client_ip = addr.ip().to_string();

    if !rate_limiter.check_rate_limit(&client_ip) {
        tracing::warn!("Strict rate limit exceeded for IP: {}", client_ip);
        return Err(too_many(
            "Rate limit exceeded for sensitive operations. Please try again later.",
        ));
    }

    // Occasionally clean up expired entries
    if rand::random::<u8>() < 10 {
        rate_limiter.cleanup_expired();
    }

    Ok(next.run(request).await)
}

/// Per-user limit on generation calls. Runs inside `auth_middleware`.
pub async fn generation_rate_limit_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let state = request.extensions().get::<Arc<AppState>>().cloned();
    let caller = request
        .extensions()
        .get::<Claims>()
        .map(|c| (c.sub.clone(), c.email.clone()));
    let (Some(state), Some((user_id, email))) = (state, caller) else {
        return Ok(next.run(request).await);
    };

    if !state.generation_limiter.check_rate_limit(&user_id) {
        tracing::warn!("Generation rate limit exceeded for {}", email);
        return Err(too_many("Too many generation requests. Please wait a minute."));
    }

    if rand::random::<u8>() < 10 {
        state.generation_limiter.cleanup_expired();
    }

    Ok(next.run(request).await)
}
