//! Recording platform actor
//!
//! An in-process stand-in for the chat platform. It keeps just enough state
//! to answer resolves (guilds, members, roles, channels, role assignments,
//! channel overwrites, bans, posted messages) and records every effect so
//! tests can count what actually happened. Operations can be made to fail
//! or to hang.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use warden_core::error::ActorError;
use warden_core::traits::{
    ActorResult, ChannelHandle, GuildActor, GuildHandle, LogMessage, MemberHandle, RoleHandle,
};
use warden_core::value_objects::Snowflake;

/// Operations that can be made to fail or hang
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorOp {
    ResolveGuild,
    SetMemberRole,
    SetChannelSend,
    SetBan,
    PostMessage,
    EditMessage,
    DirectNotify,
}

/// An effect the actor was asked to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorCall {
    SetMemberRole {
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        present: bool,
        /// Whether the call changed anything
        effective: bool,
    },
    SetChannelSend {
        channel_id: Snowflake,
        role_id: Snowflake,
        allowed: bool,
    },
    SetBan {
        guild_id: Snowflake,
        user_id: Snowflake,
        banned: bool,
    },
    DirectNotify {
        user_id: Snowflake,
        text: String,
    },
}

/// A message sitting in a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub message: LogMessage,
    pub edits: u32,
}

#[derive(Debug, Default)]
struct PlatformState {
    guilds: HashMap<Snowflake, GuildHandle>,
    members: HashMap<(Snowflake, Snowflake), MemberHandle>,
    roles: HashMap<(Snowflake, Snowflake), RoleHandle>,
    channels: HashMap<(Snowflake, Snowflake), ChannelHandle>,
    /// (guild, user, role)
    assigned: HashSet<(Snowflake, Snowflake, Snowflake)>,
    /// (channel, role) -> allowed; absent means allowed
    send_overwrites: HashMap<(Snowflake, Snowflake), bool>,
    bans: HashSet<(Snowflake, Snowflake)>,
    messages: HashMap<Snowflake, PostedMessage>,
    next_message_id: i64,
    calls: Vec<ActorCall>,
    failing: HashSet<ActorOp>,
    hanging: HashSet<ActorOp>,
}

/// Fake `GuildActor` backed by in-memory platform state
#[derive(Debug, Default)]
pub struct FakeGuildActor {
    state: Mutex<PlatformState>,
}

impl FakeGuildActor {
    pub fn new() -> Self {
        Self::default()
    }

    // === Platform setup ===

    /// Create a guild along with its `@everyone` role
    pub fn add_guild(&self, id: Snowflake, name: &str) -> GuildHandle {
        let guild = GuildHandle {
            id,
            name: name.to_string(),
        };
        let mut state = self.state.lock();
        state.guilds.insert(id, guild.clone());
        state.roles.insert(
            (id, id),
            RoleHandle {
                guild_id: id,
                id,
                name: "@everyone".to_string(),
                position: 0,
            },
        );
        guild
    }

    pub fn remove_guild(&self, id: Snowflake) {
        self.state.lock().guilds.remove(&id);
    }

    pub fn add_member(&self, guild_id: Snowflake, user_id: Snowflake, name: &str) -> MemberHandle {
        let member = MemberHandle {
            guild_id,
            user_id,
            name: name.to_string(),
        };
        self.state
            .lock()
            .members
            .insert((guild_id, user_id), member.clone());
        member
    }

    /// The member leaves; their role assignments go with them
    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) {
        let mut state = self.state.lock();
        state.members.remove(&(guild_id, user_id));
        state
            .assigned
            .retain(|(g, u, _)| !(*g == guild_id && *u == user_id));
    }

    pub fn add_role(&self, guild_id: Snowflake, id: Snowflake, name: &str, position: i32) -> RoleHandle {
        let role = RoleHandle {
            guild_id,
            id,
            name: name.to_string(),
            position,
        };
        self.state.lock().roles.insert((guild_id, id), role.clone());
        role
    }

    pub fn remove_role(&self, guild_id: Snowflake, id: Snowflake) {
        let mut state = self.state.lock();
        state.roles.remove(&(guild_id, id));
        state.assigned.retain(|(g, _, r)| !(*g == guild_id && *r == id));
    }

    pub fn add_channel(&self, guild_id: Snowflake, id: Snowflake, name: &str) -> ChannelHandle {
        let channel = ChannelHandle {
            guild_id,
            id,
            name: name.to_string(),
        };
        self.state
            .lock()
            .channels
            .insert((guild_id, id), channel.clone());
        channel
    }

    pub fn remove_channel(&self, guild_id: Snowflake, id: Snowflake) {
        self.state.lock().channels.remove(&(guild_id, id));
    }

    /// Set a channel overwrite directly, bypassing the call log
    pub fn set_send_overwrite(&self, channel_id: Snowflake, role_id: Snowflake, allowed: bool) {
        self.state
            .lock()
            .send_overwrites
            .insert((channel_id, role_id), allowed);
    }

    /// Someone deleted a posted message by hand
    pub fn delete_message(&self, message_id: Snowflake) {
        self.state.lock().messages.remove(&message_id);
    }

    // === Fault injection ===

    pub fn fail(&self, op: ActorOp) {
        self.state.lock().failing.insert(op);
    }

    /// Calls to `op` never complete
    pub fn hang(&self, op: ActorOp) {
        self.state.lock().hanging.insert(op);
    }

    pub fn recover(&self, op: ActorOp) {
        let mut state = self.state.lock();
        state.failing.remove(&op);
        state.hanging.remove(&op);
    }

    async fn gate(&self, op: ActorOp) -> ActorResult<()> {
        let (failing, hanging) = {
            let state = self.state.lock();
            (state.failing.contains(&op), state.hanging.contains(&op))
        };
        if hanging {
            std::future::pending::<()>().await;
        }
        if failing {
            return Err(ActorError::Forbidden(format!("{op:?} refused")));
        }
        Ok(())
    }

    // === Observations ===

    pub fn has_role(&self, guild_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> bool {
        self.state
            .lock()
            .assigned
            .contains(&(guild_id, user_id, role_id))
    }

    pub fn calls(&self) -> Vec<ActorCall> {
        self.state.lock().calls.clone()
    }

    /// Role calls for one member, effective or not
    pub fn role_calls(&self, guild_id: Snowflake, user_id: Snowflake) -> Vec<ActorCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(call, ActorCall::SetMemberRole { guild_id: g, user_id: u, .. }
                    if *g == guild_id && *u == user_id)
            })
            .collect()
    }

    /// Role removals that actually took a role away
    pub fn effective_removals(&self, guild_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(call, ActorCall::SetMemberRole {
                    guild_id: g, user_id: u, role_id: r, present: false, effective: true
                } if *g == guild_id && *u == user_id && *r == role_id)
            })
            .count()
    }

    pub fn can_send(&self, channel_id: Snowflake, role_id: Snowflake) -> bool {
        self.state
            .lock()
            .send_overwrites
            .get(&(channel_id, role_id))
            .copied()
            .unwrap_or(true)
    }

    pub fn is_banned(&self, guild_id: Snowflake, user_id: Snowflake) -> bool {
        self.state.lock().bans.contains(&(guild_id, user_id))
    }

    pub fn message(&self, message_id: Snowflake) -> Option<PostedMessage> {
        self.state.lock().messages.get(&message_id).cloned()
    }

    /// Messages in a channel, oldest first
    pub fn messages_in(&self, channel_id: Snowflake) -> Vec<LogMessage> {
        let state = self.state.lock();
        let mut posted: Vec<_> = state
            .messages
            .iter()
            .filter(|(_, m)| m.channel_id == channel_id)
            .map(|(id, m)| (*id, m.message.clone()))
            .collect();
        posted.sort_by_key(|(id, _)| *id);
        posted.into_iter().map(|(_, m)| m).collect()
    }

    pub fn direct_messages(&self, user_id: Snowflake) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ActorCall::DirectNotify { user_id: u, text } if u == user_id => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl GuildActor for FakeGuildActor {
    async fn resolve_guild(&self, guild_id: Snowflake) -> ActorResult<Option<GuildHandle>> {
        self.gate(ActorOp::ResolveGuild).await?;
        Ok(self.state.lock().guilds.get(&guild_id).cloned())
    }

    async fn resolve_member(
        &self,
        guild: &GuildHandle,
        user_id: Snowflake,
    ) -> ActorResult<Option<MemberHandle>> {
        Ok(self.state.lock().members.get(&(guild.id, user_id)).cloned())
    }

    async fn resolve_role(
        &self,
        guild: &GuildHandle,
        role_id: Snowflake,
    ) -> ActorResult<Option<RoleHandle>> {
        Ok(self.state.lock().roles.get(&(guild.id, role_id)).cloned())
    }

    async fn resolve_channel(
        &self,
        guild: &GuildHandle,
        channel_id: Snowflake,
    ) -> ActorResult<Option<ChannelHandle>> {
        Ok(self.state.lock().channels.get(&(guild.id, channel_id)).cloned())
    }

    async fn set_member_role(
        &self,
        member: &MemberHandle,
        role: &RoleHandle,
        present: bool,
    ) -> ActorResult<()> {
        self.gate(ActorOp::SetMemberRole).await?;
        let mut state = self.state.lock();
        if !state.members.contains_key(&(member.guild_id, member.user_id)) {
            return Err(ActorError::NotFound(format!("member {}", member.user_id)));
        }
        if !state.roles.contains_key(&(role.guild_id, role.id)) {
            return Err(ActorError::NotFound(format!("role {}", role.id)));
        }

        let key = (member.guild_id, member.user_id, role.id);
        let effective = if present {
            state.assigned.insert(key)
        } else {
            state.assigned.remove(&key)
        };
        state.calls.push(ActorCall::SetMemberRole {
            guild_id: member.guild_id,
            user_id: member.user_id,
            role_id: role.id,
            present,
            effective,
        });
        Ok(())
    }

    async fn channel_send_permission(
        &self,
        channel: &ChannelHandle,
        role: &RoleHandle,
    ) -> ActorResult<bool> {
        Ok(self.can_send(channel.id, role.id))
    }

    async fn set_channel_send_permission(
        &self,
        channel: &ChannelHandle,
        role: &RoleHandle,
        allowed: bool,
    ) -> ActorResult<()> {
        self.gate(ActorOp::SetChannelSend).await?;
        let mut state = self.state.lock();
        state.send_overwrites.insert((channel.id, role.id), allowed);
        state.calls.push(ActorCall::SetChannelSend {
            channel_id: channel.id,
            role_id: role.id,
            allowed,
        });
        Ok(())
    }

    async fn set_ban(
        &self,
        guild: &GuildHandle,
        user_id: Snowflake,
        banned: bool,
        _reason: &str,
    ) -> ActorResult<()> {
        self.gate(ActorOp::SetBan).await?;
        let mut state = self.state.lock();
        if banned {
            state.bans.insert((guild.id, user_id));
            state.members.remove(&(guild.id, user_id));
        } else {
            state.bans.remove(&(guild.id, user_id));
        }
        state.calls.push(ActorCall::SetBan {
            guild_id: guild.id,
            user_id,
            banned,
        });
        Ok(())
    }

    async fn post_message(
        &self,
        guild: &GuildHandle,
        channel_id: Snowflake,
        message: &LogMessage,
    ) -> ActorResult<Snowflake> {
        self.gate(ActorOp::PostMessage).await?;
        let mut state = self.state.lock();
        if !state.channels.contains_key(&(guild.id, channel_id)) {
            return Err(ActorError::NotFound(format!("channel {channel_id}")));
        }
        state.next_message_id += 1;
        let id = Snowflake::new(9_000_000 + state.next_message_id);
        state.messages.insert(
            id,
            PostedMessage {
                guild_id: guild.id,
                channel_id,
                message: message.clone(),
                edits: 0,
            },
        );
        Ok(id)
    }

    async fn edit_message(
        &self,
        _guild: &GuildHandle,
        channel_id: Snowflake,
        message_id: Snowflake,
        message: &LogMessage,
    ) -> ActorResult<()> {
        self.gate(ActorOp::EditMessage).await?;
        let mut state = self.state.lock();
        match state.messages.get_mut(&message_id) {
            Some(posted) if posted.channel_id == channel_id => {
                posted.message = message.clone();
                posted.edits += 1;
                Ok(())
            }
            _ => Err(ActorError::NotFound(format!("message {message_id}"))),
        }
    }

    async fn direct_notify(&self, user_id: Snowflake, text: &str) -> ActorResult<()> {
        self.gate(ActorOp::DirectNotify).await?;
        self.state.lock().calls.push(ActorCall::DirectNotify {
            user_id,
            text: text.to_string(),
        });
        Ok(())
    }
}
