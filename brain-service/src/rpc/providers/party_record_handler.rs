//! Read access to System, Company and Client records, tenant scoped.

use crate::models::{Filter, Identifier, Party, PartyRecord, PartyType, ServicePermissions};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::store::{BrainStore, PartyStore};
use crate::services::tenant_filter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub fn service_name(party_type: PartyType) -> &'static str {
    match party_type {
        PartyType::System => "SystemRecordHandler",
        PartyType::Company => "CompanyRecordHandler",
        PartyType::Client => "ClientRecordHandler",
    }
}

fn methods(party_type: PartyType) -> &'static [&'static str] {
    match party_type {
        PartyType::System => &["Retrieve"],
        PartyType::Company | PartyType::Client => &["Retrieve", "Collect"],
    }
}

/// The tenant filter narrows what each tier sees, so every tier may call.
pub fn permissions(party_type: PartyType) -> ServicePermissions {
    ServicePermissions::new(service_name(party_type)).all_tiers(methods(party_type))
}

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub identifier: Identifier,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub party: Party,
}

#[derive(Debug, Default, Deserialize)]
pub struct CollectRequest {
    #[serde(default)]
    pub identifier: Option<Identifier>,
}

#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub records: Vec<PartyRecord>,
    pub total: usize,
}

pub struct PartyRecordHandler {
    party_type: PartyType,
    store: Arc<dyn BrainStore>,
}

impl PartyRecordHandler {
    pub fn new(party_type: PartyType, store: Arc<dyn BrainStore>) -> Self {
        Self { party_type, store }
    }

    async fn retrieve(
        &self,
        ctx: &CallContext,
        request: RetrieveRequest,
    ) -> Result<RetrieveResponse, RpcError> {
        request.identifier.validate()?;
        let filter = tenant_filter::scope(request.identifier.to_filter(), ctx.claims()?);

        let party = self
            .store
            .find_one_party(self.party_type, &filter)
            .await?
            .ok_or_else(|| RpcError::Service(format!("{} not found", self.party_type)))?;
        Ok(RetrieveResponse { party })
    }

    async fn collect(
        &self,
        ctx: &CallContext,
        request: CollectRequest,
    ) -> Result<CollectResponse, RpcError> {
        let filter = match &request.identifier {
            Some(identifier) => {
                identifier.validate()?;
                identifier.to_filter()
            }
            None => Filter::All,
        };
        let filter = tenant_filter::scope(filter, ctx.claims()?);

        let records: Vec<PartyRecord> = self
            .store
            .find_parties(self.party_type, &filter)
            .await?
            .into_iter()
            .map(Party::into_record)
            .collect();
        Ok(CollectResponse {
            total: records.len(),
            records,
        })
    }
}

#[async_trait]
impl RpcProvider for PartyRecordHandler {
    fn name(&self) -> &'static str {
        service_name(self.party_type)
    }

    fn methods(&self) -> &'static [&'static str] {
        methods(self.party_type)
    }

    fn permissions(&self) -> ServicePermissions {
        permissions(self.party_type)
    }

    async fn call(
        &self,
        ctx: &CallContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        match method {
            "Retrieve" => encode_result(&self.retrieve(ctx, decode_params(params)?).await?),
            "Collect" if self.party_type != PartyType::System => {
                encode_result(&self.collect(ctx, decode_params(params)?).await?)
            }
            other => Err(RpcError::MethodNotFound(format!(
                "{}.{}",
                self.name(),
                other
            ))),
        }
    }
}
