use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{Booking, Conversation, Notification, Trip, User};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![index_unique(bson::doc! { "email": 1 })],
    )
    .await?;

    // Trips
    create_indexes(
        db,
        Trip::COLLECTION,
        vec![
            index(bson::doc! { "status": 1, "departure_time": 1 }),
            index(bson::doc! { "driver_id": 1, "departure_time": -1 }),
        ],
    )
    .await?;

    // Bookings
    create_indexes(
        db,
        Booking::COLLECTION,
        vec![
            index(bson::doc! { "trip_id": 1, "status": 1 }),
            index(bson::doc! { "passenger_id": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Conversations
    create_indexes(
        db,
        Conversation::COLLECTION,
        vec![index(bson::doc! { "participant_ids": 1 })],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        Notification::COLLECTION,
        vec![
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
            index(bson::doc! { "user_id": 1, "is_read": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
