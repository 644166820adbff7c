use utoipa::OpenApi;
use veto_session_back::services::documentation::ApiDoc;

fn main() -> Result<(), serde_json::Error> {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}
