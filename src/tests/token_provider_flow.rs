#[cfg(test)]
mod test {
    use std::time::Duration;

    use http::StatusCode;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use reqwest::Client;

    use crate::auth::token_provider::TokenProvider;
    use crate::cache::token::CachedToken;
    use crate::cache::token_cache::TokenCache;
    use crate::config::settings::ClientConfig;
    use crate::error::ShippingError;
    use crate::helpers::time::now_utc;
    use crate::tests::common::{config_for, json, mock_token_endpoint, ACCESS_TOKEN};

    fn provider(config: &ClientConfig) -> TokenProvider {
        TokenProvider::new(config, Client::new(), TokenCache::new())
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_endpoint(&server, 3600);
        let provider = provider(&config_for(&server));

        let first = provider.get_token().await.unwrap();
        let second = provider.get_token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.access_token, ACCESS_TOKEN);
        assert_eq!(first.token_type.as_deref(), Some("BearerToken"));
        assert_eq!(first.raw["org"], "org-id");
        token_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn cached_entry_lives_for_half_the_reported_expiry() {
        let server = MockServer::start_async().await;
        let _token_mock = mock_token_endpoint(&server, 3600);
        let provider = provider(&config_for(&server));

        provider.get_token().await.unwrap();

        let ttl = provider.cache().remaining_ttl(provider.cache_key()).await.unwrap();
        assert!(ttl <= Duration::from_millis(1_800_000));
        assert!(ttl > Duration::from_millis(1_795_000), "ttl was {:?}", ttl);
    }

    #[tokio::test]
    async fn prepopulated_cache_means_no_network_call() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_endpoint(&server, 3600);
        let provider = provider(&config_for(&server));

        let seeded = CachedToken::from_response(json!({"access_token": "seeded", "expiresIn": 600}), now_utc()).unwrap();
        provider.cache().put(provider.cache_key(), seeded.clone(), 60_000).await;

        for _ in 0..5 {
            assert_eq!(provider.get_token().await.unwrap(), seeded);
        }
        assert_eq!(token_mock.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_base_url_is_a_transport_error() {
        let config = ClientConfig::new("key", "secret").with_base_url("not a url");
        let provider = provider(&config);

        let err = provider.get_token().await.unwrap_err();

        assert!(err.is_transport(), "expected transport error, got {err}");
        assert!(provider.cache().get(provider.cache_key()).await.is_none());
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        // bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ClientConfig::new("key", "secret").with_base_url(format!("http://127.0.0.1:{}/shippingservices", port));
        let provider = provider(&config);

        assert!(matches!(provider.get_token().await, Err(ShippingError::Transport(_))));
        assert!(provider.cache().is_empty().await);
    }

    #[tokio::test]
    async fn server_error_is_an_http_error_and_not_cached() {
        let server = MockServer::start_async().await;
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(500).json_body(json!({"error": "internal"}));
        });
        let provider = provider(&config_for(&server));

        let err = provider.get_token().await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.detail(), Some(&json!({"error": "internal"})));
        assert!(provider.cache().get(provider.cache_key()).await.is_none());

        // a failure is not remembered, the next call tries again
        let _ = provider.get_token().await;
        token_mock.assert_calls(2);
    }

    #[tokio::test]
    async fn carrier_error_array_is_unwrapped() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(401).json_body(json!([
                {"errorCode": "PB-APIM-ERR-1003", "message": "Invalid client credentials"}
            ]));
        });
        let provider = provider(&config_for(&server));

        let err = provider.get_token().await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(
            err.detail(),
            Some(&json!({"errorCode": "PB-APIM-ERR-1003", "message": "Invalid client credentials"}))
        );
    }

    #[tokio::test]
    async fn ok_without_token_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200).json_body(json!({"unexpected": true}));
        });
        let provider = provider(&config_for(&server));

        assert!(matches!(provider.get_token().await, Err(ShippingError::Decode(_))));
        assert!(provider.cache().is_empty().await);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_nothing_stale() {
        let server = MockServer::start_async().await;
        let mut ok_mock = mock_token_endpoint(&server, 3600);
        let provider = provider(&config_for(&server));
        provider.get_token().await.unwrap();

        ok_mock.delete();
        server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(503);
        });
        provider.invalidate().await;

        let err = provider.get_token().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(provider.cache().get(provider.cache_key()).await.is_none());
    }

    #[tokio::test]
    async fn zero_expiry_token_is_returned_but_not_cached() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_endpoint(&server, 0);
        let provider = provider(&config_for(&server));

        assert_eq!(provider.get_token().await.unwrap().expires_in_seconds, 0.0);
        assert!(provider.cache().is_empty().await);
        provider.get_token().await.unwrap();
        token_mock.assert_calls(2);
    }

    #[tokio::test]
    async fn fractional_expiry_is_cached_for_half_of_it() {
        let server = MockServer::start_async().await;
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200).json_body(json!({"access_token": ACCESS_TOKEN, "expiresIn": 3599.5}));
        });
        let provider = provider(&config_for(&server));

        let token = provider.get_token().await.unwrap();
        assert_eq!(token.expires_in_seconds, 3599.5);

        let ttl = provider.cache().remaining_ttl(provider.cache_key()).await.unwrap();
        assert!(ttl <= Duration::from_millis(1_799_750));
        assert!(ttl > Duration::from_millis(1_794_000), "ttl was {:?}", ttl);

        assert_eq!(provider.get_token().await.unwrap(), token);
        token_mock.assert_calls(1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_share_one_authorization_call() {
        let server = MockServer::start_async().await;
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .delay(Duration::from_millis(300))
                .json_body(crate::tests::common::token_body(3600));
        });
        let provider = provider(&config_for(&server));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.get_token().await })
            })
            .collect();

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().unwrap());
        }
        assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
        token_mock.assert_calls(1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_share_one_failure() {
        let server = MockServer::start_async().await;
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(500).delay(Duration::from_millis(300));
        });
        let provider = provider(&config_for(&server));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.get_token().await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        }
        token_mock.assert_calls(1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancelled_fetch_is_retried_once_for_all_waiters() {
        let server = MockServer::start_async().await;
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .delay(Duration::from_millis(300))
                .json_body(crate::tests::common::token_body(3600));
        });
        let provider = provider(&config_for(&server));

        let leader = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.get_token().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let waiters: Vec<_> = (0..5)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.get_token().await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(50)).await;
        leader.abort();

        let mut tokens = Vec::new();
        for waiter in waiters {
            tokens.push(waiter.await.unwrap().unwrap());
        }
        assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
        // the aborted request may or may not have reached the server
        let calls = token_mock.calls();
        assert!((1..=2).contains(&calls), "token endpoint called {} times", calls);
    }

    #[tokio::test]
    async fn fixed_cache_key_is_shared_across_providers() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_endpoint(&server, 3600);
        let cache = TokenCache::new();
        let config = config_for(&server).with_cache_key("pitney-bowes-oauth-token");

        let a = TokenProvider::new(&config, Client::new(), cache.clone());
        let b = TokenProvider::new(&config, Client::new(), cache.clone());
        assert_eq!(a.cache_key(), "pitney-bowes-oauth-token");

        a.get_token().await.unwrap();
        b.get_token().await.unwrap();
        token_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn different_credentials_do_not_share_tokens() {
        let server = MockServer::start_async().await;
        let _token_mock = mock_token_endpoint(&server, 3600);
        let cache = TokenCache::new();

        let a = TokenProvider::new(&config_for(&server), Client::new(), cache.clone());
        let other = ClientConfig::new("other-key", "other-secret").with_base_url(config_for(&server).base_url);
        let b = TokenProvider::new(&other, Client::new(), cache.clone());
        assert_ne!(a.cache_key(), b.cache_key());

        a.get_token().await.unwrap();
        // the mock only accepts the first credential pair
        assert_eq!(b.get_token().await.unwrap_err().status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(cache.len().await, 1);
    }
}
