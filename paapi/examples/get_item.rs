use paapi::{Client, Credentials, PaapiError};
use secrecy::SecretString;

#[tokio::main]
pub async fn main() -> Result<(), PaapiError> {
    let credentials = Credentials::new(
        Some("access_key".to_string()),
        Some(SecretString::from("secret_key".to_string())),
        Some("partner-20".to_string()),
    )?;
    let client = Client::new(credentials)?;

    let item = client.get_item("B00KALEHJE").await?;
    println!("{}: {:?}", item.title, item.url);
    Ok(())
}
