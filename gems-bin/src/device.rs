//! Demo device backend.
//!
//! A small in-memory device with named configurations, a live parameter
//! map and a directive registry. It exists to exercise the protocol stack
//! end to end; nothing here persists across process lifetime.

use gems_protocol::{
    GemsResult, Message, MessageBuilder, MessageKind, ParameterBuilder, ParameterNode, ResultCode,
};
use gems_server::{HandlerError, MessageHandler, DEFAULT_SESSION_TOKEN};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// A named remote operation: takes the request arguments, returns the
/// return values and a result.
pub type DirectiveFunction = fn(&[ParameterNode]) -> (Vec<ParameterNode>, GemsResult);

pub struct DemoDevice {
    configs: BTreeMap<String, Vec<ParameterNode>>,
    params: BTreeMap<String, ParameterNode>,
    directives: BTreeMap<String, DirectiveFunction>,
}

fn must_build(builder: ParameterBuilder) -> ParameterNode {
    builder.build().expect("demo parameter is valid")
}

fn channel(n: i32, rates: [i32; 2]) -> ParameterNode {
    let name = must_build(
        ParameterBuilder::new()
            .name("ChannelName")
            .strings([format!("Channel{n}")]),
    );
    let id = must_build(ParameterBuilder::new().name("ChannelID").ints([n]));
    let bit_rates = must_build(ParameterBuilder::new().name("BitRates").ints(rates));
    must_build(
        ParameterBuilder::new()
            .name(format!("Channel{n}"))
            .parameters([name, id, bit_rates]),
    )
}

fn identify(_args: &[ParameterNode]) -> (Vec<ParameterNode>, GemsResult) {
    let model = must_build(
        ParameterBuilder::new()
            .name("Model")
            .strings(["GEMS demo device"]),
    );
    let version = must_build(ParameterBuilder::new().name("Version").strings(["1.4"]));
    (vec![model, version], GemsResult::success())
}

fn reset_statistics(args: &[ParameterNode]) -> (Vec<ParameterNode>, GemsResult) {
    // Accepts an optional list of channel names; resets everything when
    // called bare.
    let count = if args.is_empty() { 3 } else { args.len() as i32 };
    let reset = must_build(
        ParameterBuilder::new()
            .name("ChannelsReset")
            .ints([count]),
    );
    (vec![reset], GemsResult::success())
}

impl DemoDevice {
    pub fn new() -> Self {
        let channels = vec![
            channel(0, [200, 2000]),
            channel(1, [400, 4000]),
            channel(2, [600, 6000]),
        ];
        let channel_list = must_build(
            ParameterBuilder::new()
                .name("ChannelList")
                .parameters(channels.clone()),
        );
        let directives_list = must_build(
            ParameterBuilder::new()
                .name("Directives")
                .strings(["identify", "resetStatistics"]),
        );

        let mut default_config = channels;
        default_config.push(channel_list);
        default_config.push(directives_list);

        let mut configs = BTreeMap::new();
        configs.insert("default".to_string(), default_config);

        let mut directives: BTreeMap<String, DirectiveFunction> = BTreeMap::new();
        directives.insert("identify".to_string(), identify);
        directives.insert("resetStatistics".to_string(), reset_statistics);

        let mut device = DemoDevice {
            configs,
            params: BTreeMap::new(),
            directives,
        };
        device
            .load_config("default")
            .expect("default configuration exists");
        device
    }

    /// Wrap the device into the handler the servers expect.
    pub fn into_handler(self) -> MessageHandler {
        let device = Arc::new(Mutex::new(self));
        Arc::new(move |req: &Message| {
            let mut device = device
                .lock()
                .map_err(|_| HandlerError::internal("device state poisoned"))?;
            device.handle(req)
        })
    }

    /// Handle one request from a connected peer.
    pub fn handle(&mut self, req: &Message) -> Result<Message, HandlerError> {
        let mut builder = MessageBuilder::new()
            .token(DEFAULT_SESSION_TOKEN)
            .result_code(ResultCode::Success);
        if let Some(id) = req.transaction_id() {
            builder = builder.transaction_id(id);
        }

        builder = match req {
            Message::LoadConfig(m) => {
                let builder = builder.kind(MessageKind::LoadConfigResponse);
                match self.load_config(&m.config_name) {
                    Ok(loaded) => builder.parameter_count(loaded as i32),
                    Err(description) => builder
                        .result_code(ResultCode::InvalidParameter)
                        .response_description(description),
                }
            }
            Message::GetConfigList(_) => builder
                .kind(MessageKind::GetConfigListResponse)
                .configuration_list(self.configs.keys().cloned()),
            Message::GetConfig(m) => {
                let (params, result) = self.get_config(&m.desired_parameters);
                builder
                    .kind(MessageKind::GetConfigResponse)
                    .result(result)
                    .parameters(params)
            }
            Message::SetConfig(m) => {
                let (set, result) = self.set_config(&m.parameters);
                builder
                    .kind(MessageKind::SetConfigResponse)
                    .parameter_count(set as i32)
                    .result(result)
            }
            Message::SaveConfig(m) => {
                let saved = self.save_config(&m.config_name);
                builder
                    .kind(MessageKind::SaveConfigResponse)
                    .parameter_count(saved as i32)
            }
            Message::Directive(m) => {
                let (params, result) = self.call_directive(&m.directive_name, &m.arguments);
                builder
                    .kind(MessageKind::DirectiveResponse)
                    .directive(m.directive_name.as_str())
                    .parameters(params)
                    .result(result)
            }
            Message::Ping(_) => builder.kind(MessageKind::PingResponse),
            other => {
                warn!(kind = %other.kind(), "unsupported request");
                builder
                    .kind(MessageKind::UnknownResponse)
                    .result_code(ResultCode::UnsupportedMessage)
            }
        };

        builder.build().map_err(HandlerError::from)
    }

    fn load_config(&mut self, name: &str) -> Result<usize, String> {
        let params = self
            .configs
            .get(name)
            .ok_or_else(|| format!("unknown configuration name '{name}'"))?;

        self.params = params
            .iter()
            .map(|p| (p.name().to_string(), p.clone()))
            .collect();
        Ok(params.len())
    }

    fn get_config(&self, desired: &[String]) -> (Vec<ParameterNode>, GemsResult) {
        if desired.is_empty() {
            return (self.params.values().cloned().collect(), GemsResult::success());
        }

        let mut params = Vec::with_capacity(desired.len());
        for name in desired {
            match self.params.get(name) {
                Some(p) => params.push(p.clone()),
                None => {
                    return (
                        Vec::new(),
                        GemsResult::new(ResultCode::InvalidParameter, name),
                    )
                }
            }
        }
        (params, GemsResult::success())
    }

    fn set_config(&mut self, params: &[ParameterNode]) -> (usize, GemsResult) {
        for p in params {
            if !self.params.contains_key(p.name()) {
                return (0, GemsResult::new(ResultCode::InvalidParameter, p.name()));
            }
        }

        for p in params {
            self.params.insert(p.name().to_string(), p.clone());
        }
        (params.len(), GemsResult::success())
    }

    fn save_config(&mut self, name: &str) -> usize {
        let params: Vec<ParameterNode> = self.params.values().cloned().collect();
        let count = params.len();
        self.configs.insert(name.to_string(), params);
        count
    }

    fn call_directive(
        &self,
        name: &str,
        args: &[ParameterNode],
    ) -> (Vec<ParameterNode>, GemsResult) {
        match self.directives.get(name) {
            Some(f) => f(args),
            None => (
                Vec::new(),
                GemsResult::new(
                    ResultCode::InvalidParameter,
                    format!("unknown directive '{name}'"),
                ),
            ),
        }
    }
}

impl Default for DemoDevice {
    fn default() -> Self {
        DemoDevice::new()
    }
}
