use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Store;
use crate::dto::billing_dto::{CreatePlanPayload, VerifyPaymentPayload};
use crate::error::{Error, Result};
use crate::models::profile::CompanyProfile;
use crate::models::subscription::{Payment, PaymentStatus, Subscription, SubscriptionPlan};
use crate::policy::{self, Capability, Operation, Ownership, Principal};
use crate::services::payment_gateway::PaymentGateway;
use crate::utils::time::Clock;

const EVERYONE: &[Capability] = &[Capability::Company, Capability::Candidate, Capability::Admin];

/// Price in major units to gateway minor units.
pub fn to_minor_units(price: Decimal) -> Option<i64> {
    (price * Decimal::from(100)).round().to_i64()
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    currency: String,
}

impl BillingService {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
            currency: currency.into(),
        }
    }

    async fn caller_company(&self, principal: &Principal, operation: Operation) -> Result<CompanyProfile> {
        let user = principal.require_user()?;
        policy::require(principal, &[Capability::Company], operation)?;
        self.store
            .find_company_profile_by_user(user.id)
            .await?
            .ok_or(Error::NoCompanyProfile)
    }

    async fn owned_subscription(
        &self,
        principal: &Principal,
        id: Uuid,
        operation: Operation,
    ) -> Result<Subscription> {
        let company = self.caller_company(principal, operation).await?;
        let subscription = self
            .store
            .find_subscription(id)
            .await?
            .ok_or(Error::SubscriptionNotFound)?;
        policy::check(
            principal,
            &[Capability::Company],
            operation,
            Ownership::of(subscription.company_id, company.id),
        )
        .into_result()?;
        Ok(subscription)
    }

    pub async fn list_plans(&self, principal: &Principal) -> Result<Vec<SubscriptionPlan>> {
        policy::require(principal, EVERYONE, Operation::List)?;
        Ok(self.store.list_plans().await?)
    }

    pub async fn get_plan(&self, principal: &Principal, id: Uuid) -> Result<SubscriptionPlan> {
        policy::require(principal, EVERYONE, Operation::Retrieve)?;
        self.store
            .find_plan(id)
            .await?
            .ok_or(Error::NotFound("Plan"))
    }

    pub async fn create_plan(&self, principal: &Principal, payload: CreatePlanPayload) -> Result<SubscriptionPlan> {
        principal.require_user()?;
        policy::require(principal, &[Capability::Admin], Operation::Create)?;
        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            plan_type: payload.plan_type,
            duration_days: payload.duration_days,
            price: payload.price,
            job_post_limit: payload.job_post_limit.unwrap_or(0),
        };
        let plan = self.store.insert_plan(&plan).await?;
        info!(plan_id = %plan.id, name = %plan.name, "plan created");
        Ok(plan)
    }

    /// Opens a subscription window. An active subscription to the same plan
    /// blocks a new one unless it has already run past its end date, in which
    /// case it is closed first.
    pub async fn subscribe(&self, principal: &Principal, plan_id: Uuid) -> Result<Subscription> {
        let company = self.caller_company(principal, Operation::Create).await?;
        let plan = self.store.find_plan(plan_id).await?.ok_or(Error::InvalidPlan)?;
        let now = self.clock.now();

        if let Some(current) = self.store.find_active_subscription(company.id, plan.id).await? {
            if !current.has_lapsed(now) {
                return Err(Error::DuplicateActiveSubscription);
            }
            self.store.deactivate_subscription(current.id).await?;
            info!(subscription_id = %current.id, "lapsed subscription closed");
        }

        let subscription = Subscription::start(company.id, &plan, now);
        let subscription = self
            .store
            .insert_subscription(&subscription)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicateActiveSubscription))?;
        info!(
            subscription_id = %subscription.id,
            company_id = %company.id,
            plan_id = %plan.id,
            end_date = %subscription.end_date,
            "subscription started"
        );
        Ok(subscription)
    }

    pub async fn my_subscriptions(&self, principal: &Principal) -> Result<Vec<Subscription>> {
        let company = self.caller_company(principal, Operation::List).await?;
        Ok(self.store.list_subscriptions(Some(company.id)).await?)
    }

    /// Opens a gateway order for the subscription's plan price and records it
    /// as a pending payment. One payment per subscription.
    pub async fn create_payment(&self, principal: &Principal, subscription_id: Uuid) -> Result<Payment> {
        let subscription = self
            .owned_subscription(principal, subscription_id, Operation::Create)
            .await?;
        if self
            .store
            .find_payment_for_subscription(subscription.id)
            .await?
            .is_some()
        {
            return Err(Error::DuplicatePayment);
        }
        let plan = self
            .store
            .find_plan(subscription.plan_id)
            .await?
            .ok_or(Error::InvalidPlan)?;
        let amount = to_minor_units(plan.price)
            .ok_or_else(|| Error::Internal(format!("plan price out of range: {}", plan.price)))?;

        let order = self
            .gateway
            .create_order(amount, &self.currency, &subscription.id.to_string())
            .await?;

        let payment = Payment {
            id: Uuid::new_v4(),
            subscription_id: subscription.id,
            order_id: order.id,
            payment_id: None,
            signature: None,
            amount,
            currency: self.currency.clone(),
            status: PaymentStatus::Pending,
            payment_method: None,
            created_at: self.clock.now(),
        };
        let payment = self
            .store
            .insert_payment(&payment)
            .await
            .map_err(|e| Error::on_conflict(e, Error::DuplicatePayment))?;
        info!(payment_id = %payment.id, order_id = %payment.order_id, amount, "payment order opened");
        Ok(payment)
    }

    /// Checks the gateway signature before marking the payment successful.
    /// A bad signature marks it failed.
    pub async fn verify_payment(&self, principal: &Principal, payload: VerifyPaymentPayload) -> Result<Payment> {
        let subscription = self
            .owned_subscription(principal, payload.subscription_id, Operation::Update)
            .await?;
        let mut payment = match self.store.find_payment_for_subscription(subscription.id).await? {
            Some(p) if p.order_id == payload.order_id => p,
            _ => return Err(Error::NotFound("Payment")),
        };
        if payment.status == PaymentStatus::Success {
            return Ok(payment);
        }

        let valid = self
            .gateway
            .verify_signature(&payload.order_id, &payload.payment_id, &payload.signature);
        payment.payment_id = Some(payload.payment_id);
        payment.signature = Some(payload.signature);
        payment.payment_method = payload.payment_method;

        if !valid {
            payment.status = PaymentStatus::Failed;
            self.store.update_payment(&payment).await?;
            warn!(payment_id = %payment.id, order_id = %payment.order_id, "payment signature rejected");
            return Err(Error::PaymentVerificationFailed);
        }

        payment.status = PaymentStatus::Success;
        let payment = self.store.update_payment(&payment).await?;
        info!(payment_id = %payment.id, order_id = %payment.order_id, "payment verified");
        Ok(payment)
    }

    pub async fn admin_subscriptions(&self, principal: &Principal) -> Result<Vec<Subscription>> {
        principal.require_user()?;
        policy::require(principal, &[Capability::Admin], Operation::List)?;
        Ok(self.store.list_subscriptions(None).await?)
    }

    pub async fn admin_payments(&self, principal: &Principal) -> Result<Vec<Payment>> {
        principal.require_user()?;
        policy::require(principal, &[Capability::Admin], Operation::List)?;
        Ok(self.store.list_payments().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{BillingStore, MemoryStore, ProfileStore};
    use crate::models::subscription::PlanType;
    use crate::models::user::Role;
    use crate::policy::AuthUser;
    use crate::services::payment_gateway::{GatewayError, MockPaymentGateway, Order};
    use crate::utils::time::ManualClock;
    use chrono::Duration;

    fn principal(role: Role) -> Principal {
        Principal::User(AuthUser {
            id: Uuid::new_v4(),
            email: "u@x.com".into(),
            role,
            is_staff: role == Role::Admin,
            is_superuser: role == Role::Admin,
        })
    }

    async fn company(store: &MemoryStore, who: &Principal) -> CompanyProfile {
        store
            .insert_company_profile(&CompanyProfile {
                id: Uuid::new_v4(),
                user_id: who.user().unwrap().id,
                company_name: "Acme".into(),
                industry: "Software".into(),
                location: "Pune".into(),
                website: None,
                description: None,
                image: None,
            })
            .await
            .unwrap()
    }

    async fn plan(store: &MemoryStore) -> SubscriptionPlan {
        store
            .insert_plan(&SubscriptionPlan {
                id: Uuid::new_v4(),
                name: "Basic".into(),
                plan_type: PlanType::Basic,
                duration_days: 30,
                price: Decimal::new(49950, 2),
                job_post_limit: 5,
            })
            .await
            .unwrap()
    }

    fn ordering_gateway() -> MockPaymentGateway {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_order()
            .times(1)
            .returning(|amount, currency, _| {
                Ok(Order {
                    id: "order_test_1".into(),
                    amount,
                    currency: currency.to_string(),
                })
            });
        gateway
    }

    fn service(store: Arc<MemoryStore>, gateway: MockPaymentGateway, clock: &ManualClock) -> BillingService {
        BillingService::new(store, Arc::new(gateway), Arc::new(clock.clone()), "INR")
    }

    #[test]
    fn minor_units_round_to_paise() {
        assert_eq!(to_minor_units(Decimal::new(49950, 2)), Some(49950));
        assert_eq!(to_minor_units(Decimal::new(499, 0)), Some(49900));
    }

    #[tokio::test]
    async fn one_active_subscription_per_plan_until_it_lapses() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let acme = principal(Role::Company);
        company(&store, &acme).await;
        let basic = plan(&store).await;
        let svc = service(store.clone(), MockPaymentGateway::new(), &clock);

        let first = svc.subscribe(&acme, basic.id).await.unwrap();
        assert_eq!(first.end_date - first.start_date, Duration::days(30));
        assert!(matches!(
            svc.subscribe(&acme, basic.id).await,
            Err(Error::DuplicateActiveSubscription)
        ));

        clock.advance(Duration::days(31));
        let second = svc.subscribe(&acme, basic.id).await.unwrap();
        assert_ne!(first.id, second.id);
        let closed = store.find_subscription(first.id).await.unwrap().unwrap();
        assert!(!closed.is_active);
        assert_eq!(svc.my_subscriptions(&acme).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_plan_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let acme = principal(Role::Company);
        company(&store, &acme).await;
        let svc = service(store, MockPaymentGateway::new(), &clock);
        assert!(matches!(svc.subscribe(&acme, Uuid::new_v4()).await, Err(Error::InvalidPlan)));
    }

    #[tokio::test]
    async fn one_payment_per_subscription() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let acme = principal(Role::Company);
        company(&store, &acme).await;
        let basic = plan(&store).await;
        let svc = service(store, ordering_gateway(), &clock);

        let sub = svc.subscribe(&acme, basic.id).await.unwrap();
        let payment = svc.create_payment(&acme, sub.id).await.unwrap();
        assert_eq!(payment.amount, 49950);
        assert_eq!(payment.currency, "INR");
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.order_id, "order_test_1");
        assert!(matches!(svc.create_payment(&acme, sub.id).await, Err(Error::DuplicatePayment)));
    }

    #[tokio::test]
    async fn foreign_subscriptions_are_denied() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let acme = principal(Role::Company);
        let rival = principal(Role::Company);
        company(&store, &acme).await;
        company(&store, &rival).await;
        let basic = plan(&store).await;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_order().never();
        let svc = service(store, gateway, &clock);

        let sub = svc.subscribe(&acme, basic.id).await.unwrap();
        assert!(matches!(svc.create_payment(&rival, sub.id).await, Err(Error::PermissionDenied)));
        assert!(matches!(
            svc.create_payment(&acme, Uuid::new_v4()).await,
            Err(Error::SubscriptionNotFound)
        ));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_no_payment() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let acme = principal(Role::Company);
        company(&store, &acme).await;
        let basic = plan(&store).await;
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_order()
            .returning(|_, _, _| Err(GatewayError::Transport("timeout".into())));
        let svc = service(store.clone(), gateway, &clock);

        let sub = svc.subscribe(&acme, basic.id).await.unwrap();
        assert!(matches!(svc.create_payment(&acme, sub.id).await, Err(Error::Gateway(_))));
        assert!(store.find_payment_for_subscription(sub.id).await.unwrap().is_none());
    }

    fn verify(sub: Uuid, signature: &str) -> VerifyPaymentPayload {
        VerifyPaymentPayload {
            order_id: "order_test_1".into(),
            payment_id: "pay_1".into(),
            signature: signature.into(),
            subscription_id: sub,
            payment_method: Some("card".into()),
        }
    }

    #[tokio::test]
    async fn bad_signature_marks_the_payment_failed() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let acme = principal(Role::Company);
        company(&store, &acme).await;
        let basic = plan(&store).await;
        let mut gateway = ordering_gateway();
        gateway
            .expect_verify_signature()
            .returning(|_, _, signature| signature == "good");
        let svc = service(store.clone(), gateway, &clock);

        let sub = svc.subscribe(&acme, basic.id).await.unwrap();
        svc.create_payment(&acme, sub.id).await.unwrap();

        assert!(matches!(
            svc.verify_payment(&acme, verify(sub.id, "forged")).await,
            Err(Error::PaymentVerificationFailed)
        ));
        let stored = store.find_payment_for_subscription(sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);

        let paid = svc.verify_payment(&acme, verify(sub.id, "good")).await.unwrap();
        assert_eq!(paid.status, PaymentStatus::Success);
        assert_eq!(paid.payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn verification_needs_the_recorded_order() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let acme = principal(Role::Company);
        company(&store, &acme).await;
        let basic = plan(&store).await;
        let svc = service(store, ordering_gateway(), &clock);

        let sub = svc.subscribe(&acme, basic.id).await.unwrap();
        svc.create_payment(&acme, sub.id).await.unwrap();
        let mut wrong = verify(sub.id, "good");
        wrong.order_id = "order_other".into();
        assert!(matches!(svc.verify_payment(&acme, wrong).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn plans_are_public_but_admin_made() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::default();
        let svc = service(store, MockPaymentGateway::new(), &clock);
        let payload = CreatePlanPayload {
            name: "Pro".into(),
            plan_type: PlanType::Advance,
            duration_days: 365,
            price: Decimal::new(4999, 0),
            job_post_limit: None,
        };
        assert!(matches!(
            svc.create_plan(&principal(Role::Company), payload.clone()).await,
            Err(Error::PermissionDenied)
        ));
        let plan = svc.create_plan(&principal(Role::Admin), payload).await.unwrap();
        assert_eq!(plan.job_post_limit, 0);
        assert_eq!(svc.list_plans(&Principal::Anonymous).await.unwrap().len(), 1);
        assert!(svc.admin_payments(&principal(Role::Company)).await.is_err());
    }
}
