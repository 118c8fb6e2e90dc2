//! Input Manager (C7). Owns the webhook bus, the ESMTP interceptor, and the
//! processor registry's lifecycle; wires the single shared AI community
//! client into every processor at construction time so the dependency only
//! ever flows handler → client, never the reverse (design note).

use std::sync::Arc;

use tracing::info;

use crate::ai::CommunityClient;
use crate::config::Config;
use crate::esmtp::Server as EsmtpServer;
use crate::processor::discord::DiscordProcessor;
use crate::processor::esmtp::EsmtpProcessor;
use crate::processor::io_bus::IoBusProcessor;
use crate::processor::irc::IrcProcessor;
use crate::processor::sdcard::SdCardProcessor;
use crate::processor::sms::SmsProcessor;
use crate::processor::voice::VoiceProcessor;
use crate::webhook::Bus;
use crate::SentinelError;

pub struct Manager {
    bus: Arc<Bus>,
    esmtp: EsmtpServer,
}

impl Manager {
    pub fn new(config: Config, ai_client: Arc<dyn CommunityClient>) -> Self {
        let bus = Arc::new(Bus::new(config.bus));

        bus.register_processor(Arc::new(DiscordProcessor::new(config.processors.discord, ai_client.clone())))
            .expect("discord processor registers exactly once at startup");
        bus.register_processor(Arc::new(SmsProcessor::new(config.processors.sms, ai_client.clone())))
            .expect("sms processor registers exactly once at startup");
        bus.register_processor(Arc::new(VoiceProcessor::new(config.processors.voice, ai_client.clone())))
            .expect("voice processor registers exactly once at startup");
        bus.register_processor(Arc::new(IrcProcessor::new(config.processors.irc, ai_client.clone())))
            .expect("irc processor registers exactly once at startup");
        bus.register_processor(Arc::new(SdCardProcessor::new(config.processors.sdcard, ai_client.clone())))
            .expect("sdcard processor registers exactly once at startup");
        bus.register_processor(Arc::new(IoBusProcessor::new(config.processors.io_bus, ai_client.clone())))
            .expect("io_bus processor registers exactly once at startup");

        let esmtp_processor = Arc::new(EsmtpProcessor::new(config.esmtp.clone(), ai_client.clone()));
        bus.register_processor(Arc::new(EsmtpProcessor::new(config.esmtp.clone(), ai_client)))
            .expect("esmtp webhook-variant processor registers exactly once at startup");

        let esmtp = EsmtpServer::new(config.esmtp, esmtp_processor);

        Self { bus, esmtp }
    }

    pub async fn start(&self) -> Result<(), SentinelError> {
        self.bus.start().await?;
        self.esmtp.start().await?;
        info!("input manager started");
        Ok(())
    }

    pub fn shutdown(&self) -> Result<(), SentinelError> {
        self.esmtp.stop()?;
        self.bus.stop()?;
        info!("input manager shut down");
        Ok(())
    }

    pub fn registered_processors(&self) -> Vec<String> {
        self.bus.registered_processors()
    }
}
