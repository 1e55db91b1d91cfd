use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dapr_inventory::context::CallContext;
use dapr_inventory::dapr::dispatch::EventRegistrar;
use dapr_inventory::dapr::subscription::Subscriber;
use dapr_inventory::error::ApiError;
use dapr_inventory::features::gadgets::Gadget;
use dapr_inventory::features::products::Product;
use dapr_inventory::features::widgets::Widget;
use dapr_inventory::features::{Resource, ResourceService, Store};
use dapr_inventory::sdk::SdkRegistrar;
use serde_json::{json, Value};

/// A store that records what it saves and the call context it saw.
pub struct Recorded<T> {
    items: Arc<Mutex<Vec<T>>>,
    contexts: Arc<Mutex<Vec<CallContext>>>,
    fail: bool,
}

impl<T> Clone for Recorded<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            contexts: Arc::clone(&self.contexts),
            fail: self.fail,
        }
    }
}

impl<T: Clone> Recorded<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::default(),
            contexts: Arc::default(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    pub fn contexts(&self) -> Vec<CallContext> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Resource + Clone> Store<T> for Recorded<T> {
    async fn load(&self, id: &str) -> Result<T, ApiError> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("{} {id:?} not found", T::KIND)))
    }

    async fn save(&self, item: &T) -> Result<(), ApiError> {
        self.contexts.lock().unwrap().push(CallContext::current());
        if self.fail {
            return Err(ApiError::internal(
                std::io::Error::other("disk full"),
                format!("could not save {} {:?}", T::KIND, item.id()),
            ));
        }
        self.items.lock().unwrap().push(item.clone());
        Ok(())
    }
}

/// The three feature modules over recording stores.
pub struct Modules {
    pub widgets: Recorded<Widget>,
    pub gadgets: Recorded<Gadget>,
    pub products: Recorded<Product>,
    widget_service: ResourceService<Widget>,
    gadget_service: ResourceService<Gadget>,
    product_service: ResourceService<Product>,
}

impl Modules {
    pub fn new() -> Self {
        Self::with_gadgets(Recorded::new())
    }

    /// Modules whose gadget store rejects every save.
    pub fn with_failing_gadgets() -> Self {
        Self::with_gadgets(Recorded::failing())
    }

    fn with_gadgets(gadgets: Recorded<Gadget>) -> Self {
        let widgets = Recorded::new();
        let products = Recorded::new();
        Self {
            widget_service: ResourceService::new(widgets.clone()),
            gadget_service: ResourceService::new(gadgets.clone()),
            product_service: ResourceService::new(products.clone()),
            widgets,
            gadgets,
            products,
        }
    }

    pub fn subscribers(&self) -> [&dyn Subscriber; 3] {
        [&self.widget_service, &self.gadget_service, &self.product_service]
    }

    pub fn registrars(&self) -> [&dyn EventRegistrar; 3] {
        [&self.widget_service, &self.gadget_service, &self.product_service]
    }

    pub fn sdk_registrars(&self) -> [&dyn SdkRegistrar; 3] {
        [&self.widget_service, &self.gadget_service, &self.product_service]
    }

    pub fn gadget_service(&self) -> &ResourceService<Gadget> {
        &self.gadget_service
    }
}

/// A structured-mode CloudEvent as the sidecar delivers it over HTTP.
pub fn cloud_event(event_type: &str, data: Value) -> Value {
    json!({
        "id": "evt-1",
        "source": "inventory-tests",
        "specversion": "1.0",
        "type": event_type,
        "datacontenttype": "application/json",
        "topic": "inventory",
        "pubsubname": "pubsub",
        "data": data
    })
}

pub fn widget_data() -> Value {
    json!({ "id": "w1", "description": "small widget", "price": 1.25 })
}

pub fn gadget_data() -> Value {
    json!({ "id": "g1", "description": "large gadget", "price": 10.0 })
}

pub fn product_data() -> Value {
    json!({ "id": "p1", "description": "product", "price": 3.5 })
}

/// The merged subscription list every surface must serve.
pub fn expected_subscriptions() -> Value {
    json!([{
        "pubsubname": "pubsub",
        "topic": "inventory",
        "routes": {
            "rules": [
                { "match": "event.type == \"widget.v1\"", "path": "/widgets.v1" },
                { "match": "event.type == \"gadget.v1\"", "path": "/gadgets.v1" }
            ],
            "default": "/products.v1"
        }
    }])
}
