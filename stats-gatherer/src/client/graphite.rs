use super::{
    SourceFuture,
    TimeSeriesSource,
};
use crate::{
    error::{
        GatherError,
        Result,
    },
    metrics::{
        MetricPath,
        Sample,
        ServerName,
    },
};
use reqwest::Client as HttpClient;
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use std::time::Duration;
use url::Url;

/// One entry of a `/metrics/find` response
#[derive(Debug, Clone, Deserialize)]
struct FindEntry {
    path: String,
}

/// One series of a `/render` response
#[derive(Debug, Clone, Deserialize)]
pub struct RenderSeries {
    pub target: String,
    /// Passed through untouched, nothing reads it.
    #[serde(default)]
    pub tags: serde_json::Value,
    /// `[value, timestamp]` pairs, value is `null` for empty slots.
    pub datapoints: Vec<(Option<f64>, i64)>,
}

/// Talks to the Graphite HTTP API (`/metrics/find` and `/render`)
#[derive(Debug, Clone)]
pub struct GraphiteClient {
    http_client: HttpClient,
    base_url: Url,
    metrics_dir: String,
}

impl GraphiteClient {
    pub fn new(base_url: Url, metrics_dir: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|source| GatherError::Transport {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            http_client,
            base_url,
            metrics_dir: metrics_dir.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn find(&self, query: &str) -> Result<Vec<FindEntry>> {
        self.get_json(&self.endpoint("metrics/find"), &[("query", query), ("format", "json")])
            .await
    }

    async fn render(&self, target: &str, lookback: Duration) -> Result<Vec<RenderSeries>> {
        let from = relative_offset(lookback);
        self.get_json(
            &self.endpoint("render"),
            &[("target", target), ("from", from.as_str()), ("format", "json")],
        )
        .await
    }

    /// Single GET, body read in full before parsing so read failures and parse failures stay apart.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let request = self
            .http_client
            .get(endpoint)
            .query(query)
            .build()
            .map_err(|source| GatherError::Transport {
                url: endpoint.to_string(),
                source,
            })?;
        let url = request.url().to_string();
        debug!(%url, "graphite request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|source| GatherError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatherError::HttpStatus { url, status });
        }

        let body = response.bytes().await.map_err(|source| GatherError::Transport {
            url: url.clone(),
            source,
        })?;
        debug!(%url, bytes = body.len(), "graphite response");

        serde_json::from_slice(&body).map_err(|source| GatherError::Decode { url, source })
    }
}

impl TimeSeriesSource for GraphiteClient {
    fn list_servers<'a>(&'a self, root_prefix: &'a str) -> SourceFuture<'a, Vec<ServerName>> {
        Box::pin(async move {
            let entries = self.find(&format!("{root_prefix}.*")).await?;
            Ok(entries
                .into_iter()
                .map(|entry| MetricPath::from(entry.path).last_segment().to_string())
                .collect())
        })
    }

    fn list_metrics<'a>(&'a self, root_prefix: &'a str, server: &'a str) -> SourceFuture<'a, Vec<MetricPath>> {
        Box::pin(async move {
            let entries = self
                .find(&format!("{root_prefix}.{server}.{}.*", self.metrics_dir))
                .await?;
            Ok(entries.into_iter().map(|entry| MetricPath::from(entry.path)).collect())
        })
    }

    fn fetch_series<'a>(&'a self, metric: &'a MetricPath, lookback: Duration) -> SourceFuture<'a, Vec<Sample>> {
        Box::pin(async move {
            let series = self.render(metric.as_str(), lookback).await?;
            Ok(series
                .into_iter()
                .flat_map(|series| series.datapoints)
                .map(|(value, timestamp)| Sample::new(timestamp, value))
                .collect())
        })
    }
}

/// Graphite `from` parameter for a trailing window, in the largest unit that divides it (`-7d`, `-90min`).
pub fn relative_offset(lookback: Duration) -> String {
    const UNITS: [(u64, &str); 3] = [(86_400, "d"), (3_600, "h"), (60, "min")];

    let seconds = lookback.as_secs();
    UNITS
        .iter()
        .find(|(size, _)| seconds > 0 && seconds % size == 0)
        .map(|(size, unit)| format!("-{}{unit}", seconds / size))
        .unwrap_or_else(|| format!("-{seconds}s"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn client(url: Url) -> GraphiteClient {
        GraphiteClient::new(url, "snmp", TIMEOUT).unwrap()
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(relative_offset(Duration::from_secs(7 * 86_400)), "-7d");
        assert_eq!(relative_offset(Duration::from_secs(12 * 3_600)), "-12h");
        assert_eq!(relative_offset(Duration::from_secs(90 * 60)), "-90min");
        assert_eq!(relative_offset(Duration::from_secs(45)), "-45s");
        assert_eq!(relative_offset(Duration::ZERO), "-0s");
    }

    #[tokio::test]
    async fn list_servers_returns_last_segments_in_order() {
        let (url, server) = serve(vec![(
            200,
            r#"[{"path":"root.prefix.host-b"},{"path":"root.prefix.host-a"}]"#,
        )])
        .await;

        let servers = client(url).list_servers("root.prefix").await.unwrap();
        assert_eq!(servers, vec!["host-b".to_string(), "host-a".to_string()]);

        let requests = server.await.unwrap();
        assert_eq!(requests, vec!["GET /metrics/find?query=root.prefix.*&format=json HTTP/1.1"]);
    }

    #[tokio::test]
    async fn list_metrics_scopes_query_to_server() {
        let (url, server) = serve(vec![(
            200,
            r#"[{"path":"root.host-a.snmp.cpu","leaf":1},{"path":"root.host-a.snmp.mem"}]"#,
        )])
        .await;

        let metrics = client(url).list_metrics("root", "host-a").await.unwrap();
        assert_eq!(
            metrics,
            vec![MetricPath::new("root.host-a.snmp.cpu"), MetricPath::new("root.host-a.snmp.mem")]
        );

        let requests = server.await.unwrap();
        assert_eq!(requests, vec!["GET /metrics/find?query=root.host-a.snmp.*&format=json HTTP/1.1"]);
    }

    #[tokio::test]
    async fn fetch_series_flattens_series_and_keeps_nulls() {
        let (url, server) = serve(vec![(
            200,
            r#"[
                {"target":"cpu","tags":{"name":"cpu"},"datapoints":[[1.5,100],[null,160]]},
                {"target":"cpu","datapoints":[[3,220]]}
            ]"#,
        )])
        .await;

        let metric = MetricPath::new("root.host-a.snmp.cpu");
        let samples = client(url)
            .fetch_series(&metric, Duration::from_secs(7 * 86_400))
            .await
            .unwrap();
        assert_eq!(
            samples,
            vec![Sample::new(100, 1.5), Sample::new(160, None::<f64>), Sample::new(220, 3.0)]
        );

        let requests = server.await.unwrap();
        assert_eq!(
            requests,
            vec!["GET /render?target=root.host-a.snmp.cpu&from=-7d&format=json HTTP/1.1"]
        );
    }

    #[tokio::test]
    async fn base_url_path_is_kept() {
        let (url, server) = serve(vec![(200, "[]")]).await;
        let url = url.join("/graphite/").unwrap();

        let servers = client(url).list_servers("root").await.unwrap();
        assert!(servers.is_empty());

        let requests = server.await.unwrap();
        assert_eq!(requests, vec!["GET /graphite/metrics/find?query=root.*&format=json HTTP/1.1"]);
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let (url, _server) = serve(vec![(503, "unavailable")]).await;

        let err = client(url).list_servers("root").await.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, GatherError::HttpStatus { status, .. } if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (url, _server) = serve(vec![(200, r#"{"not":"a list"}"#)]).await;

        let err = client(url).list_servers("root").await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        drop(listener);

        let err = client(url).list_servers("root").await.unwrap_err();
        assert!(matches!(err, GatherError::Transport { .. }));
    }

    #[tokio::test]
    async fn request_timeout_is_applied() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        let _silent = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = GraphiteClient::new(url, "snmp", Duration::from_millis(200)).unwrap();
        let err = client.list_servers("root").await.unwrap_err();
        match err {
            GatherError::Transport { source, .. } => assert!(source.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }
}
