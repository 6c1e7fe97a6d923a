/*
[INPUT]:  Task id and report format
[OUTPUT]: Opaque report file bytes
[POS]:    HTTP layer - report export endpoints
[UPDATE]: When report formats change
*/

use reqwest::Method;

use crate::http::{EngineClient, Result};
use crate::types::{ReportFormat, TaskId};

impl EngineClient {
    /// Export a task report
    ///
    /// GET /api/v1/reports/tasks/{id}/export/{json|html}
    pub async fn export_report(&self, task_id: TaskId, format: ReportFormat) -> Result<Vec<u8>> {
        let endpoint = format!("reports/tasks/{task_id}/export/{}", format.extension());
        let response = self.send(Method::GET, &endpoint, |builder| builder).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use crate::http::EngineClient;
    use crate::types::ReportFormat;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_export_html_returns_raw_bytes() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/api/v1/reports/tasks/3/export/html"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>report</html>", "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let client = EngineClient::new(&server.uri()).expect("client init");
        let bytes = client
            .export_report(3, ReportFormat::Html)
            .await
            .expect("export failed");
        assert_eq!(bytes, b"<html>report</html>".to_vec());
    }
}
