use oura_api::{Client, HttpError, ReqwestClient, Request, endpoints::FetchWindow};
use std::sync::Arc;

#[tokio::main]
pub async fn main() -> Result<(), HttpError> {
    let client = Client::new(Arc::new(ReqwestClient::new()?));
    let window = FetchWindow::current();

    let req = Request::daily_readiness().list(&window);

    let records = client.send("access_token", &req).await?;
    for record in records {
        println!("{} {:?}", record.day, record.score);
    }
    Ok(())
}
