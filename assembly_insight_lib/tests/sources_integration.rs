use assembly_insight_lib::assembly_api::{NewsSearchClient, OpenAssemblyClient};
use assembly_insight_lib::sources::{
    BillSource, NewsSearchSource, NewsSource, PortalSource, RosterSource, SnsSource,
};
use assembly_insight_lib::FetchError;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn portal(server: &MockServer) -> PortalSource {
    let client = OpenAssemblyClient::with_base_url(&server.uri(), "test-key".into()).unwrap();
    PortalSource::new(client, 22)
}

#[tokio::test]
async fn roster_page_requests_page_and_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ALLNAMEMBER"))
        .and(query_param("KEY", "test-key"))
        .and(query_param("pIndex", "3"))
        .and(query_param("pSize", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"ALLNAMEMBER":[
                {"head":[{"list_total_count":1},{"RESULT":{"CODE":"INFO-000","MESSAGE":"ok"}}]},
                {"row":[{"NAAS_CD":"A0001","NAAS_NM":"홍길동","GTELT_ERACO":"제22대","PLPT_NM":"가나당","ELECD_NM":"서울 종로구"}]}
            ]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let rows = portal(&server).roster_page(3, 50).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name.as_deref(), Some("홍길동"));
}

#[tokio::test]
async fn bills_page_is_scoped_to_term_and_proposer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nzmimeepazxkubdpn"))
        .and(query_param("AGE", "22"))
        .and(query_param("PROPOSER", "홍길동"))
        .and(query_param("pIndex", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"RESULT":{"CODE":"INFO-200","MESSAGE":"해당하는 데이터가 없습니다."}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let rows = portal(&server).bills_page("홍길동", 1, 100).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/negnlnyvatsjwocar"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = portal(&server).sns_rows().await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimited));
}

#[tokio::test]
async fn server_error_is_not_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/negnlnyvatsjwocar"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = portal(&server).sns_rows().await.unwrap_err();
    assert!(matches!(err, FetchError::Api(_)));
    assert!(!err.is_rate_limited());
}

#[tokio::test]
async fn news_search_uses_member_phrase_and_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/news.json"))
        .and(query_param("query", "국회의원 홍길동"))
        .and(query_param("display", "20"))
        .and(query_param("sort", "date"))
        .and(header("X-Naver-Client-Id", "id"))
        .and(header("X-Naver-Client-Secret", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"total":1,"items":[{
                "title":"<b>홍길동</b> 의원",
                "originallink":"https://www.yna.co.kr/view/1",
                "link":"https://n.news.naver.com/article/001/1",
                "description":"",
                "pubDate":"Mon, 12 Jan 2026 08:50:00 +0900"
            }]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = NewsSearchClient::with_base_url(&server.uri(), "id".into(), "secret".into()).unwrap();
    let source = NewsSearchSource::new(client, 20);
    let items = source.search_news("홍길동").await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link, "https://n.news.naver.com/article/001/1");
}
