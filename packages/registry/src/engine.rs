use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event, maybe_participant, participant};
use crate::error::RegistryError;
use crate::timeparse;

/// Normalized event tuple handed over by the ingestion adapters.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub ctftime_id: String,
    pub message_id: String,
    pub title: String,
    pub url: String,
    pub start: String,
    pub end: String,
    pub description: String,
}

/// Plain snapshot of an event plus both rosters. Lists are deduplicated and
/// lexicographically ordered; safe to render without further synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub ctftime_id: String,
    pub message_id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub participants: Vec<String>,
    pub maybe_participants: Vec<String>,
}

#[derive(Clone, Copy)]
enum Role {
    Confirmed,
    Tentative,
}

/// Query/mutation API over the event registry.
///
/// Stateless between calls: holds only the connection handle and the
/// community timezone. Every mutating operation is a self-contained
/// transaction; identifiers are resolved once, before any write.
#[derive(Clone)]
pub struct Registry {
    db: DatabaseConnection,
    tz: Tz,
}

impl Registry {
    pub fn new(db: DatabaseConnection, tz: Tz) -> Self {
        Self { db, tz }
    }

    /// Create or fully overwrite the event row keyed by `ctftime_id`.
    /// Participation edges are never touched.
    #[instrument(skip(self, input), fields(ctftime_id = %input.ctftime_id))]
    pub async fn upsert_event(&self, input: NewEvent) -> Result<EventRecord, RegistryError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let model = match event::Entity::find_by_id(&input.ctftime_id).one(&txn).await? {
            Some(existing) => {
                let mut active: event::ActiveModel = existing.into();
                active.message_id = Set(input.message_id);
                active.title = Set(input.title);
                active.url = Set(input.url);
                active.start = Set(input.start);
                active.end = Set(input.end);
                active.description = Set(input.description);
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                let new_event = event::ActiveModel {
                    ctftime_id: Set(input.ctftime_id),
                    message_id: Set(input.message_id),
                    title: Set(input.title),
                    url: Set(input.url),
                    start: Set(input.start),
                    end: Set(input.end),
                    description: Set(input.description),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                new_event.insert(&txn).await?
            }
        };

        let record = load_record(&txn, model).await?;
        txn.commit().await?;
        Ok(record)
    }

    /// Resolve either key to the canonical `ctftime_id`. Catalog id is tried
    /// first, then the announcement message id.
    pub async fn resolve(&self, identifier: &str) -> Result<String, RegistryError> {
        resolve_on(&self.db, identifier).await
    }

    /// Same dual-key probe as `resolve`, as a boolean.
    pub async fn exists(&self, identifier: &str) -> Result<bool, RegistryError> {
        match resolve_on(&self.db, identifier).await {
            Ok(_) => Ok(true),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Full event record plus both rosters.
    pub async fn get_event(&self, identifier: &str) -> Result<EventRecord, RegistryError> {
        let id = resolve_on(&self.db, identifier).await?;
        let model = find_event(&self.db, &id).await?;
        load_record(&self.db, model).await
    }

    #[instrument(skip(self))]
    pub async fn add_participant(
        &self,
        identifier: &str,
        name: &str,
    ) -> Result<(), RegistryError> {
        self.add_edges(identifier, &[name.to_string()], Role::Confirmed)
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_participant(
        &self,
        identifier: &str,
        name: &str,
    ) -> Result<(), RegistryError> {
        self.remove_edges(identifier, &[name.to_string()], Role::Confirmed)
            .await
    }

    #[instrument(skip(self))]
    pub async fn add_maybe_participant(
        &self,
        identifier: &str,
        name: &str,
    ) -> Result<(), RegistryError> {
        self.add_edges(identifier, &[name.to_string()], Role::Tentative)
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_maybe_participant(
        &self,
        identifier: &str,
        name: &str,
    ) -> Result<(), RegistryError> {
        self.remove_edges(identifier, &[name.to_string()], Role::Tentative)
            .await
    }

    pub async fn add_participants(
        &self,
        identifier: &str,
        names: &[String],
    ) -> Result<(), RegistryError> {
        self.add_edges(identifier, names, Role::Confirmed).await
    }

    pub async fn remove_participants(
        &self,
        identifier: &str,
        names: &[String],
    ) -> Result<(), RegistryError> {
        self.remove_edges(identifier, names, Role::Confirmed).await
    }

    pub async fn add_maybe_participants(
        &self,
        identifier: &str,
        names: &[String],
    ) -> Result<(), RegistryError> {
        self.add_edges(identifier, names, Role::Tentative).await
    }

    pub async fn remove_maybe_participants(
        &self,
        identifier: &str,
        names: &[String],
    ) -> Result<(), RegistryError> {
        self.remove_edges(identifier, names, Role::Tentative).await
    }

    /// Next event with at least one participation edge of either kind and a
    /// start instant strictly after `now`.
    pub async fn next_event(&self, now: DateTime<Utc>) -> Result<EventRecord, RegistryError> {
        let mut best: Option<(DateTime<Utc>, event::Model)> = None;
        for model in self.interested_events().await? {
            let Some(start) = timeparse::parse_instant(&model.start, self.tz) else {
                continue;
            };
            if start <= now {
                continue;
            }
            if best.as_ref().is_none_or(|(t, _)| start < *t) {
                best = Some((start, model));
            }
        }
        match best {
            Some((_, model)) => load_record(&self.db, model).await,
            None => Err(RegistryError::NoUpcomingEvent),
        }
    }

    /// Events with interest whose start instant falls in
    /// `[now, now + span_days)`, ascending by start.
    pub async fn events_in_window(
        &self,
        now: DateTime<Utc>,
        span_days: i64,
    ) -> Result<Vec<EventRecord>, RegistryError> {
        let until = now + Duration::days(span_days);
        let mut hits: Vec<(DateTime<Utc>, event::Model)> = Vec::new();
        for model in self.interested_events().await? {
            let Some(start) = timeparse::parse_instant(&model.start, self.tz) else {
                continue;
            };
            if start >= now && start < until {
                hits.push((start, model));
            }
        }
        if hits.is_empty() {
            return Err(RegistryError::NoUpcomingEvent);
        }
        hits.sort_by_key(|(start, _)| *start);

        let mut records = Vec::with_capacity(hits.len());
        for (_, model) in hits {
            records.push(load_record(&self.db, model).await?);
        }
        Ok(records)
    }

    /// Administrative removal: deletes the event and both edge sets in one
    /// transaction.
    #[instrument(skip(self))]
    pub async fn delete_event(&self, identifier: &str) -> Result<(), RegistryError> {
        let txn = self.db.begin().await?;
        let id = resolve_on(&txn, identifier).await?;

        participant::Entity::delete_many()
            .filter(participant::Column::CtftimeId.eq(&id))
            .exec(&txn)
            .await?;
        maybe_participant::Entity::delete_many()
            .filter(maybe_participant::Column::CtftimeId.eq(&id))
            .exec(&txn)
            .await?;
        event::Entity::delete_by_id(&id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// All-or-nothing edge insertion. Already-present edges are skipped, not
    /// an error.
    async fn add_edges(
        &self,
        identifier: &str,
        names: &[String],
        role: Role,
    ) -> Result<(), RegistryError> {
        let txn = self.db.begin().await?;
        let id = resolve_on(&txn, identifier).await?;
        let now = Utc::now();

        for name in names {
            let result = match role {
                Role::Confirmed => {
                    let edge = participant::ActiveModel {
                        ctftime_id: Set(id.clone()),
                        name: Set(name.clone()),
                        added_at: Set(now),
                    };
                    edge.insert(&txn).await.map(|_| ())
                }
                Role::Tentative => {
                    let edge = maybe_participant::ActiveModel {
                        ctftime_id: Set(id.clone()),
                        name: Set(name.clone()),
                        added_at: Set(now),
                    };
                    edge.insert(&txn).await.map(|_| ())
                }
            };
            match result {
                Ok(()) => {}
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
                Err(e) => return Err(e.into()),
            }
        }

        txn.commit().await?;
        Ok(())
    }

    /// All-or-nothing edge removal. Absent edges are a no-op.
    async fn remove_edges(
        &self,
        identifier: &str,
        names: &[String],
        role: Role,
    ) -> Result<(), RegistryError> {
        let txn = self.db.begin().await?;
        let id = resolve_on(&txn, identifier).await?;

        match role {
            Role::Confirmed => {
                participant::Entity::delete_many()
                    .filter(participant::Column::CtftimeId.eq(&id))
                    .filter(participant::Column::Name.is_in(names))
                    .exec(&txn)
                    .await?;
            }
            Role::Tentative => {
                maybe_participant::Entity::delete_many()
                    .filter(maybe_participant::Column::CtftimeId.eq(&id))
                    .filter(maybe_participant::Column::Name.is_in(names))
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }

    /// Events with at least one edge in either set. The interest gate on the
    /// selection queries is deliberate: surface actionable events, not merely
    /// known ones.
    async fn interested_events(&self) -> Result<Vec<event::Model>, RegistryError> {
        let models = event::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        event::Column::CtftimeId.in_subquery(
                            SeaQuery::select()
                                .column(participant::Column::CtftimeId)
                                .from(participant::Entity)
                                .to_owned(),
                        ),
                    )
                    .add(
                        event::Column::CtftimeId.in_subquery(
                            SeaQuery::select()
                                .column(maybe_participant::Column::CtftimeId)
                                .from(maybe_participant::Entity)
                                .to_owned(),
                        ),
                    ),
            )
            .all(&self.db)
            .await?;
        Ok(models)
    }
}

async fn resolve_on<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
) -> Result<String, RegistryError> {
    if let Some(model) = event::Entity::find_by_id(identifier).one(conn).await? {
        return Ok(model.ctftime_id);
    }
    let by_message = event::Entity::find()
        .filter(event::Column::MessageId.eq(identifier))
        .one(conn)
        .await?;
    match by_message {
        Some(model) => Ok(model.ctftime_id),
        None => Err(RegistryError::NotFound(identifier.to_string())),
    }
}

async fn find_event<C: ConnectionTrait>(
    conn: &C,
    ctftime_id: &str,
) -> Result<event::Model, RegistryError> {
    event::Entity::find_by_id(ctftime_id)
        .one(conn)
        .await?
        .ok_or_else(|| RegistryError::NotFound(ctftime_id.to_string()))
}

async fn load_record<C: ConnectionTrait>(
    conn: &C,
    model: event::Model,
) -> Result<EventRecord, RegistryError> {
    let participants = participant::Entity::find()
        .filter(participant::Column::CtftimeId.eq(&model.ctftime_id))
        .order_by_asc(participant::Column::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let maybe_participants = maybe_participant::Entity::find()
        .filter(maybe_participant::Column::CtftimeId.eq(&model.ctftime_id))
        .order_by_asc(maybe_participant::Column::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    Ok(EventRecord {
        ctftime_id: model.ctftime_id,
        message_id: model.message_id,
        title: model.title,
        url: model.url,
        description: model.description,
        start: model.start,
        end: model.end,
        participants,
        maybe_participants,
    })
}
