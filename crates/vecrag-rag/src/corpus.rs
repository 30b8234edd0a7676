//! Demo corpus of cloud service descriptions used by `vecrag seed`

use serde::{Deserialize, Serialize};
use vecrag_core::Document;

/// A cloud service record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudService {
    pub key: u32,
    pub name: String,
    pub description: String,
}

impl CloudService {
    fn new(key: u32, name: &str, description: &str) -> Self {
        Self {
            key,
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    /// Document text is `"{name}: {description}"`
    pub fn to_document(&self) -> Document {
        Document::new(
            self.key.to_string(),
            format!("{}: {}", self.name, self.description),
        )
    }
}

/// The six services seeded by the demo
pub fn cloud_services() -> Vec<CloudService> {
    vec![
        CloudService::new(
            0,
            "Azure App Service",
            "Host .NET, Java, Node.js, and Python web applications and APIs in a fully managed Azure service. You only need to deploy your code to Azure. Azure takes care of all the infrastructure management like high availability, load balancing, and autoscaling.",
        ),
        CloudService::new(
            1,
            "Azure Service Bus",
            "A fully managed enterprise message broker supporting both point to point and publish-subscribe integrations. It's ideal for building decoupled applications, queue-based load leveling, or facilitating communication between microservices.",
        ),
        CloudService::new(
            2,
            "Azure Blob Storage",
            "Azure Blob Storage allows your applications to store and retrieve files in the cloud. Azure Storage is highly scalable to store massive amounts of data and data is stored redundantly to ensure high availability.",
        ),
        CloudService::new(
            3,
            "Microsoft Entra ID",
            "Manage user identities and control access to your apps, data, and resources.",
        ),
        CloudService::new(
            4,
            "Azure Key Vault",
            "Store and access application secrets like connection strings and API keys in an encrypted vault with restricted access to make sure your secrets and your application aren't compromised.",
        ),
        CloudService::new(
            5,
            "Azure AI Search",
            "Information retrieval at scale for traditional and conversational search applications, with security and options for AI enrichment and vectorization.",
        ),
    ]
}

/// Demo corpus as ingestible documents
pub fn documents() -> Vec<Document> {
    cloud_services().iter().map(CloudService::to_document).collect()
}
