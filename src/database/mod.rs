use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("webcur");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the service relies on. The unique snapshot keys
    /// double as the guard against duplicate inserts when two requests race
    /// on the same cold cache key.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = IndexOptions::builder().unique(true).build();

        let indexes = [
            ("utilisateurs", doc! { "email": 1 }, true),
            ("devises", doc! { "nom": 1, "date_maj": 1 }, true),
            ("actions", doc! { "symbole": 1, "date": 1 }, true),
            ("societes", doc! { "symbole": 1, "date_maj": 1 }, true),
            ("favoris_devises", doc! { "user_id": 1 }, true),
            ("favoris_actions", doc! { "user_id": 1 }, true),
        ];

        for (collection_name, keys, is_unique) in indexes {
            let collection = self
                .db
                .collection::<mongodb::bson::Document>(collection_name);

            let model = if is_unique {
                IndexModel::builder()
                    .keys(keys.clone())
                    .options(unique.clone())
                    .build()
            } else {
                IndexModel::builder().keys(keys.clone()).build()
            };

            match collection.create_index(model).await {
                Ok(_) => log::info!("   ✅ Index created: {}{}", collection_name, keys),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
