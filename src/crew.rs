use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("crew roster request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct CrewMember {
    pub name: String,
    pub craft: String,
}

#[derive(Debug, Deserialize)]
struct PeopleInSpace {
    #[serde(default)]
    people: Vec<CrewMember>,
}

/// Everyone currently in space aboard `craft`, from an open-notify style
/// `astros.json` document.
pub async fn fetch_crew(
    client: &reqwest::Client,
    url: &str,
    craft: &str,
) -> Result<Vec<CrewMember>, CrewError> {
    let roster: PeopleInSpace = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(aboard(roster.people, craft))
}

fn aboard(people: Vec<CrewMember>, craft: &str) -> Vec<CrewMember> {
    people
        .into_iter()
        .filter(|p| p.craft.eq_ignore_ascii_case(craft))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_craft() {
        let body = r#"{"message":"success","number":3,"people":[
            {"name":"Oleg Kononenko","craft":"ISS"},
            {"name":"Ye Guangfu","craft":"Tiangong"},
            {"name":"Tracy Dyson","craft":"ISS"}]}"#;
        let roster: PeopleInSpace = serde_json::from_str(body).unwrap();
        let crew = aboard(roster.people, "iss");
        assert_eq!(crew.len(), 2);
        assert_eq!(crew[0].name, "Oleg Kononenko");
    }

    #[test]
    fn missing_people_is_empty() {
        let roster: PeopleInSpace = serde_json::from_str(r#"{"message":"success"}"#).unwrap();
        assert!(aboard(roster.people, "ISS").is_empty());
    }
}
