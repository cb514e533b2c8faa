//! `login`, `signup`, `logout`, `whoami` and `password`

use clap::Args;

use super::{prompt_line, Context};
use crate::services::validation::{
    validate_email, validate_password, validate_password_change, validate_username,
};
use crate::services::{HttpApi, MilkApi};
use crate::types::{PasswordChange, Result, SignupRequest};

/// Sign in
#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    /// Read from stdin when omitted
    #[arg(short, long)]
    pub password: Option<String>,
}

impl LoginArgs {
    pub fn run(self, ctx: &mut Context) -> Result<()> {
        let password = match self.password {
            Some(p) => p,
            None => prompt_line("Password: ")?,
        };

        let api = HttpApi::new(&ctx.config)?;
        let session = api.sign_in(&self.username, &password)?;
        let summary = format!(
            "Signed in as {} ({})",
            session.user.username,
            session.user.role_labels()
        );
        ctx.auth.login(session)?;
        println!("{}", summary);
        Ok(())
    }
}

/// Register an account
#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub email: String,

    /// Read from stdin when omitted
    #[arg(short, long)]
    pub password: Option<String>,

    /// Requested role(s), e.g. `admin` (the server defaults to a regular user)
    #[arg(long)]
    pub role: Vec<String>,
}

impl SignupArgs {
    pub fn run(self, ctx: &Context) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        let password = match self.password {
            Some(p) => p,
            None => prompt_line("Password: ")?,
        };
        validate_password(&password)?;

        let request = SignupRequest {
            username: self.username,
            email: self.email,
            password,
            role: self.role,
        };
        let message = HttpApi::new(&ctx.config)?.sign_up(&request)?;
        println!("{}", message);
        Ok(())
    }
}

pub fn logout(ctx: &mut Context) -> Result<()> {
    if ctx.auth.current().is_none() {
        println!("Not signed in");
        return Ok(());
    }
    ctx.api()?.sign_out();
    ctx.auth.logout()?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let user = &session.user;
    let caps = ctx.capabilities();
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    println!("User:     {} (#{})", user.username, user.id);
    if !user.email.is_empty() {
        println!("Email:    {}", user.email);
    }
    if let Some(phone) = &user.phone_number {
        println!("Phone:    {}", phone);
    }
    println!("Roles:    {}", user.role_labels());
    println!("Server:   {}", ctx.config.api_url);
    println!();
    println!("View all entries:  {}", yes_no(caps.can_view_all_entries));
    println!("Assign entries:    {}", yes_no(caps.can_assign_entries));
    println!("Edit/delete:       {}", yes_no(caps.can_modify_entries));
    println!("Manage users:      {}", yes_no(caps.can_manage_users));
    Ok(())
}

/// Change the signed-in user's password
#[derive(Args, Debug)]
pub struct PasswordArgs {
    #[arg(long)]
    pub current: String,

    #[arg(long)]
    pub new: String,

    #[arg(long)]
    pub confirm: String,
}

impl PasswordArgs {
    pub fn run(self, ctx: &mut Context) -> Result<()> {
        ctx.session()?;
        let change = PasswordChange {
            current_password: self.current,
            new_password: self.new,
            confirm_password: self.confirm,
        };
        validate_password_change(&change)?;

        let result = ctx.api()?.change_password(&change);
        let message = ctx.checked(result)?;
        println!("{}", message);
        Ok(())
    }
}
