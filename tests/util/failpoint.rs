use mongodb::{
    bson::{self, doc, Document},
    error::Result,
    options::{ReadPreference, SelectionCriteria},
    Client,
};
use serde::Serialize;
use typed_builder::TypedBuilder;

/// A `configureFailPoint` command.
#[derive(Clone, Debug)]
pub struct FailPoint {
    command: Document,
}

impl FailPoint {
    fn name(&self) -> &str {
        self.command.get_str("configureFailPoint").unwrap()
    }

    /// Create a failCommand failpoint.
    /// See https://github.com/mongodb/mongo/wiki/The-%22failCommand%22-fail-point for more info.
    pub fn fail_command(
        fail_commands: &[&str],
        mode: FailPointMode,
        options: FailCommandOptions,
    ) -> FailPoint {
        let mut data = doc! {
            "failCommands": fail_commands.iter().map(|s| s.to_string()).collect::<Vec<String>>(),
        };
        for (key, value) in bson::to_document(&options).unwrap() {
            data.insert(key, value);
        }

        let command = doc! {
            "configureFailPoint": "failCommand",
            "mode": bson::to_bson(&mode).unwrap(),
            "data": data,
        };
        FailPoint { command }
    }

    /// Enables the fail point on the primary. Fails when the deployment does not allow test
    /// commands.
    pub async fn enable(self, client: &Client) -> Result<FailPointGuard> {
        client
            .database("admin")
            .run_command(self.command.clone())
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .await?;
        Ok(FailPointGuard {
            failpoint_name: self.name().to_string(),
            client: client.clone(),
        })
    }
}

/// Turns the fail point off when dropped. Requires a multi-threaded runtime.
pub struct FailPointGuard {
    client: Client,
    failpoint_name: String,
}

impl Drop for FailPointGuard {
    fn drop(&mut self) {
        let client = self.client.clone();
        let name = self.failpoint_name.clone();

        let result = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .database("admin")
                    .run_command(doc! { "configureFailPoint": name, "mode": "off" })
                    .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
                    .await
            })
        });

        if let Err(e) = result {
            println!("failed disabling failpoint: {:?}", e);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailPointMode {
    Times(i32),
}

#[derive(Debug, TypedBuilder, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailCommandOptions {
    /// Only commands from clients with this application name are affected.
    #[builder(default, setter(into, strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    app_name: Option<String>,

    /// The error code to include in the server's reply to an affected command.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<i32>,

    /// Error labels to include in the server's reply to an affected command, replacing the ones
    /// the server would add on its own.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    error_labels: Option<Vec<String>>,
}
