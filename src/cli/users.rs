//! `users` subcommands

use clap::Subcommand;

use super::report::users_table;
use super::{confirm, print_json, Context};
use crate::services::validation::validate_user_update;
use crate::services::MilkApi;
use crate::types::{MilktrackError, Result, User, UserUpdate};

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List all users (administrators)
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Number of registered users (administrators)
    Count,

    /// Show one user
    Show {
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show your own account as the server sees it
    Me {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update an account; omitted fields are left unchanged
    Update {
        id: i64,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete an account (administrators)
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl UsersCommand {
    pub fn run(self, ctx: &mut Context) -> Result<()> {
        match self {
            Self::List { json } => {
                ctx.ensure(ctx.capabilities().can_manage_users, "listing users")?;
                let result = ctx.api()?.list_users();
                let users = ctx.checked(result)?;
                if json {
                    print_json(&users)
                } else if users.is_empty() {
                    println!("No users found");
                    Ok(())
                } else {
                    println!("{}", users_table(&users));
                    println!("{} users", users.len());
                    Ok(())
                }
            }
            Self::Count => {
                ctx.ensure(ctx.capabilities().can_manage_users, "counting users")?;
                let result = ctx.api()?.count_users();
                println!("{}", ctx.checked(result)?);
                Ok(())
            }
            Self::Show { id, json } => {
                let own_id = ctx.session()?.user.id;
                if id != own_id {
                    ctx.ensure(ctx.capabilities().can_manage_users, "viewing other accounts")?;
                }
                let result = ctx.api()?.get_user(id);
                print_user(&ctx.checked(result)?, json)
            }
            Self::Me { json } => {
                ctx.session()?;
                let result = ctx.api()?.current_user();
                print_user(&ctx.checked(result)?, json)
            }
            Self::Update {
                id,
                username,
                email,
                password,
                phone,
            } => {
                let update = UserUpdate {
                    username,
                    email,
                    password,
                    phone_number: phone,
                };
                update_user(ctx, id, update)
            }
            Self::Delete { id, yes } => delete_user(ctx, id, yes),
        }
    }
}

fn update_user(ctx: &mut Context, id: i64, update: UserUpdate) -> Result<()> {
    let own_id = ctx.session()?.user.id;
    if id != own_id {
        ctx.ensure(ctx.capabilities().can_manage_users, "editing other accounts")?;
    }
    validate_user_update(&update)?;

    let result = ctx.api()?.update_user(id, &update);
    let updated = ctx.checked(result)?;

    // keep the stored session in step with one's own profile
    if id == own_id {
        let mut user = updated.clone();
        if user.roles.is_empty() {
            user.roles = ctx.session()?.user.roles.clone();
        }
        ctx.auth.set_user(user)?;
    }
    println!("Updated user {} (#{})", updated.username, updated.id);
    Ok(())
}

fn delete_user(ctx: &mut Context, id: i64, yes: bool) -> Result<()> {
    ctx.ensure(ctx.capabilities().can_manage_users, "deleting users")?;
    if ctx.session()?.user.id == id {
        return Err(MilktrackError::Validation("you cannot delete your own account".into()));
    }
    if !yes && !confirm(&format!("Delete user #{}?", id))? {
        println!("Cancelled");
        return Ok(());
    }
    let result = ctx.api()?.delete_user(id);
    println!("{}", ctx.checked(result)?);
    Ok(())
}

fn print_user(user: &User, json: bool) -> Result<()> {
    if json {
        return print_json(user);
    }
    println!("{}", users_table(std::slice::from_ref(user)));
    Ok(())
}
